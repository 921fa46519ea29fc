use thiserror::Error;

/// Failures surfaced by the solver and the move picker.
///
/// Only propagation wipe-outs are recovered internally (the search
/// backtracks); everything here is reported to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("grid size {0} is outside the supported range 2..=25")]
    SizeOutOfRange(usize),

    #[error("attempt to assign cell {location} a pipe outside its domain")]
    ValueNotInDomain { location: usize },

    #[error("cell {location} has no assignment")]
    UnassignedVariable { location: usize },

    #[error("constraint `{0}` was checked while part of its scope is unassigned")]
    UnassignedScope(String),

    #[error("invalid board encoding: {0}")]
    InvalidEncoding(String),

    #[error("oracle returned {got} scores for a board with {expected} openings")]
    OracleShape { expected: usize, got: usize },

    #[error("every candidate move has already been tried for this board")]
    MovesExhausted,

    #[error("no solution exists")]
    NoSolution,

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Asset(#[from] serde_json::Error),
}
