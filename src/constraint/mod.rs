//! The puzzle rules, each expressed as a validator plus a pruner.

mod connected;
mod half_connections;
mod no_cycles;

pub use connected::{is_connected, Connected, WipePolicy};
pub use half_connections::{no_half_connections, Axis, HalfConnections};
pub use no_cycles::{is_acyclic, NoCycles};

use crate::csp::{PruneLog, VarId, Vars};
use crate::pipe::Pipe;
use crate::{Error, Result};

/// A puzzle rule over an ordered scope of variables.
pub trait Constraint {
    /// Identifier used in logs and errors.
    fn name(&self) -> &str;

    /// The variables this constraint watches, in scope order.
    fn scope(&self) -> &[VarId];

    /// Decide satisfaction. Every variable in scope must be assigned;
    /// anything else is a caller bug and fails fast.
    fn satisfied(&self, vars: &Vars) -> Result<bool>;

    /// Strip locally inconsistent values from active domains.
    ///
    /// The removals are applied to the arena before returning, so that
    /// later pruners observe them; the returned log is exactly what was
    /// removed, in removal order, for undo.
    fn prune(&self, vars: &mut Vars) -> PruneLog;
}

/// Collect the scope's assignments for a validator.
pub(crate) fn scope_assignment(name: &str, scope: &[VarId], vars: &Vars) -> Result<Vec<Pipe>> {
    scope
        .iter()
        .map(|&id| {
            vars[id]
                .assignment()
                .ok_or_else(|| Error::UnassignedScope(name.to_string()))
        })
        .collect()
}
