//! The no-half-connections rule for adjacent pairs.

use crate::csp::{PruneLog, VarId, Vars};
use crate::pipe::{Direction, Pipe};
use crate::Result;

use super::{scope_assignment, Constraint};

/// Orientation of a neighboring pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// The first cell's side toward the second, and the way back.
    fn facing(self) -> (Direction, Direction) {
        match self {
            Axis::Horizontal => (Direction::Right, Direction::Left),
            Axis::Vertical => (Direction::Down, Direction::Up),
        }
    }
}

/// Two adjacent cells must agree on their shared boundary: both open
/// (a connection) or both closed. A one-sided opening is forbidden.
pub struct HalfConnections {
    name: String,
    axis: Axis,
    scope: [VarId; 2],
}

impl HalfConnections {
    /// Pair rule for `left` and the cell to its right.
    pub fn horizontal(left: VarId, right: VarId) -> Self {
        HalfConnections {
            name: format!("no half-connections horizontal ({}, {})", left.0, right.0),
            axis: Axis::Horizontal,
            scope: [left, right],
        }
    }

    /// Pair rule for `top` and the cell below it.
    pub fn vertical(top: VarId, bottom: VarId) -> Self {
        HalfConnections {
            name: format!("no half-connections vertical ({}, {})", top.0, bottom.0),
            axis: Axis::Vertical,
            scope: [top, bottom],
        }
    }
}

impl Constraint for HalfConnections {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> &[VarId] {
        &self.scope
    }

    fn satisfied(&self, vars: &Vars) -> Result<bool> {
        let pipes = scope_assignment(&self.name, &self.scope, vars)?;
        let (out, back) = self.axis.facing();
        Ok(pipes[0].opening(out) == pipes[1].opening(back))
    }

    fn prune(&self, vars: &mut Vars) -> PruneLog {
        let (out, back) = self.axis.facing();
        let [first, second] = self.scope;
        // Only a half-assigned pair gives the partner something to react
        // to; with both or neither assigned there is nothing to strip.
        match (vars[first].assignment(), vars[second].assignment()) {
            (Some(pipe), None) => strip(vars, second, back, pipe.opening(out)),
            (None, Some(pipe)) => strip(vars, first, out, pipe.opening(back)),
            _ => PruneLog::new(),
        }
    }
}

/// Remove active pipes of `id` whose `side` disagrees with the
/// neighbor's committed opening.
fn strip(vars: &mut Vars, id: VarId, side: Direction, open: bool) -> PruneLog {
    let doomed: Vec<Pipe> = vars[id]
        .active()
        .iter()
        .copied()
        .filter(|p| p.opening(side) != open)
        .collect();
    if doomed.is_empty() {
        return PruneLog::new();
    }
    vars.prune(id, &doomed);
    vec![(id, doomed)]
}

/// Boundary agreement across a whole board: the pairwise validators of
/// every adjacent pair, in one pass.
pub fn no_half_connections(board: &[Pipe], n: usize) -> bool {
    for row in 0..n {
        for col in 0..n {
            let i = row * n + col;
            if col + 1 < n
                && board[i].opening(Direction::Right) != board[i + 1].opening(Direction::Left)
            {
                return false;
            }
            if row + 1 < n
                && board[i].opening(Direction::Down) != board[i + n].opening(Direction::Up)
            {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csp::{Csp, Variable};
    use crate::pipe::Pipe;
    use std::rc::Rc;

    fn pair() -> Csp {
        let vars = vec![
            Variable::new(0, Pipe::BASE.to_vec()),
            Variable::new(1, Pipe::BASE.to_vec()),
        ];
        let con: Rc<dyn Constraint> = Rc::new(HalfConnections::horizontal(VarId(0), VarId(1)));
        Csp::new("pair", vars, vec![con])
    }

    #[test]
    fn validator_wants_matching_boundary() {
        let mut csp = pair();
        csp.assign(VarId(0), Pipe::new(false, true, false, false)).unwrap();
        csp.assign(VarId(1), Pipe::new(false, false, false, true)).unwrap();
        assert_eq!(csp.cons()[0].satisfied(csp.vars()).unwrap(), true);

        csp.assign(VarId(1), Pipe::new(false, true, false, false)).unwrap();
        assert_eq!(csp.cons()[0].satisfied(csp.vars()).unwrap(), false);
    }

    #[test]
    fn validator_fails_fast_on_open_scope() {
        let mut csp = pair();
        csp.assign(VarId(0), Pipe::new(false, true, false, false)).unwrap();
        assert!(csp.cons()[0].satisfied(csp.vars()).is_err());
    }

    #[test]
    fn pruner_strips_the_unassigned_partner() {
        let mut csp = pair();
        // Left cell opens right: the partner must open left.
        csp.assign(VarId(0), Pipe::new(false, true, false, false)).unwrap();
        let con = csp.cons()[0].clone();
        let log = con.prune(csp.vars_mut());

        assert_eq!(log.len(), 1);
        let (id, removed) = &log[0];
        assert_eq!(*id, VarId(1));
        assert!(removed.iter().all(|p| !p.opening(Direction::Left)));
        assert!(csp.vars()[VarId(1)]
            .active()
            .iter()
            .all(|p| p.opening(Direction::Left)));
        // 7 of the 14 base pipes open left.
        assert_eq!(csp.vars()[VarId(1)].active().len(), 7);
    }

    #[test]
    fn pruner_leaves_untouched_pairs_alone() {
        let mut csp = pair();
        let con = csp.cons()[0].clone();
        assert!(con.prune(csp.vars_mut()).is_empty());

        csp.assign(VarId(0), Pipe::new(false, true, false, false)).unwrap();
        csp.assign(VarId(1), Pipe::new(false, false, false, true)).unwrap();
        assert!(con.prune(csp.vars_mut()).is_empty());
    }

    #[test]
    fn board_wide_check() {
        // Four elbows closing a ring: every boundary agrees, so this
        // helper accepts it (the ring itself is the cycle rule's job).
        let board = crate::grid::decode("0110001111001001").unwrap();
        assert!(no_half_connections(&board, 2));
        let mut broken = board;
        broken[0] = Pipe::new(true, false, false, true);
        assert!(!no_half_connections(&broken, 2));
    }
}
