//! This crate generates solved pipe-rotation boards and proposes moves
//! for scrambled ones. The puzzle rules are expressed as constraints
//! over per-cell pipe domains; search interleaves propagation with
//! backtracking.

pub mod asset;
pub mod constraint;
pub mod grid;

mod builder;
mod csp;
mod error;
mod picker;
mod pipe;
mod propagate;
mod search;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use builder::{cell_domain, generate, generate_with, pipes_csp, MAX_SIZE, MIN_SIZE};
pub use csp::{Csp, PruneLog, VarId, Variable, Vars};
pub use error::Error;
pub use picker::{Board, Move, MovePicker, Oracle};
pub use pipe::{Direction, Pipe, Shape};
pub use propagate::propagate;
pub use search::SolveOptions;

/// A result during puzzle solving or move picking.
pub type Result<T> = std::result::Result<T, Error>;

/// Cooperative cancellation shared between a caller and a running
/// solve or pick. Cloning hands out another handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Ask the holder to stop at its next check point.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
