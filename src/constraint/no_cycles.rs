//! The acyclicity rule over the whole grid.

use std::collections::HashMap;

use crate::csp::{PruneLog, VarId, Vars};
use crate::grid;
use crate::pipe::Pipe;
use crate::Result;

use super::{scope_assignment, Constraint};

/// Whether the connection graph reachable from cell 0 carries no cycle.
pub fn is_acyclic(board: &[Pipe], n: usize) -> bool {
    let mut visited = vec![false; board.len()];
    let mut stack = vec![(0usize, usize::MAX)];
    visited[0] = true;

    while let Some((cell, parent)) = stack.pop() {
        let adjacent = grid::neighbors(cell, n);
        let linked = grid::connections(board[cell], grid::adjacent(board, cell, n));
        for d in 0..4 {
            if !linked[d] {
                continue;
            }
            let Some(next) = adjacent[d] else { continue };
            if next == parent {
                continue;
            }
            if visited[next] {
                // A second route to an already-discovered cell.
                return false;
            }
            visited[next] = true;
            stack.push((next, cell));
        }
    }
    true
}

/// The committed pipes must never close a loop, and no partial
/// assignment may be extended into one through a doubly-claimed cell.
pub struct NoCycles {
    name: String,
    scope: Vec<VarId>,
    n: usize,
}

impl NoCycles {
    pub fn new(scope: Vec<VarId>, n: usize) -> Self {
        NoCycles {
            name: "tree".to_string(),
            scope,
            n,
        }
    }
}

impl Constraint for NoCycles {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> &[VarId] {
        &self.scope
    }

    fn satisfied(&self, vars: &Vars) -> Result<bool> {
        let board = scope_assignment(&self.name, &self.scope, vars)?;
        Ok(is_acyclic(&board, self.n))
    }

    /// Find a cell that two distinct committed pipes both open toward.
    /// Closing it from both sides would complete a loop, so pipes opening
    /// on both of those sides are stripped from its active domain.
    ///
    /// At most one such cell is handled per invocation; the propagation
    /// loop re-runs the pruner until nothing more is found.
    fn prune(&self, vars: &mut Vars) -> PruneLog {
        let board = vars.partial_assignment();
        let mut visited = vec![false; board.len()];

        for start in 0..board.len() {
            if board[start].is_none() || visited[start] {
                continue;
            }
            let Some((square, first, second)) =
                duplicate_touch(&board, self.n, start, &mut visited)
            else {
                continue;
            };

            let adjacent = grid::neighbors(square, self.n);
            let mut dirs = Vec::with_capacity(2);
            for (d, neighbor) in adjacent.iter().enumerate() {
                if *neighbor == Some(first) || *neighbor == Some(second) {
                    dirs.push(d);
                }
            }
            let &[d1, d2] = dirs.as_slice() else { continue };

            let id = VarId(square);
            let doomed: Vec<Pipe> = vars[id]
                .active()
                .iter()
                .copied()
                .filter(|p| p.openings()[d1] && p.openings()[d2])
                .collect();
            if doomed.is_empty() {
                return PruneLog::new();
            }
            vars.prune(id, &doomed);
            return vec![(id, doomed)];
        }
        PruneLog::new()
    }
}

/// Walk one committed component, recording for every cell which
/// neighbor's opening points at it. Returns the first cell claimed by
/// two distinct committed pipes, with both claimants.
fn duplicate_touch(
    board: &[Option<Pipe>],
    n: usize,
    start: usize,
    visited: &mut [bool],
) -> Option<(usize, usize, usize)> {
    let mut touched: HashMap<usize, usize> = HashMap::new();
    let mut stack = vec![(start, usize::MAX)];

    while let Some((cell, prev)) = stack.pop() {
        if visited[cell] {
            continue;
        }
        visited[cell] = true;
        // Traversal only enters committed cells.
        let Some(center) = board[cell] else { continue };

        let adjacent = grid::neighbors(cell, n);
        for d in 0..4 {
            if !center.openings()[d] {
                continue;
            }
            // Domains never allow an opening off the grid.
            debug_assert!(adjacent[d].is_some());
            let Some(target) = adjacent[d] else { continue };
            if target != prev {
                if let Some(&other) = touched.get(&target) {
                    return Some((target, cell, other));
                }
            }
            touched.insert(target, cell);
        }

        let linked = grid::connections(center, grid::adjacent_partial(board, cell, n));
        for d in (0..4).rev() {
            if !linked[d] {
                continue;
            }
            let Some(next) = adjacent[d] else { continue };
            if next != prev && !visited[next] {
                stack.push((next, cell));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::pipes_csp;
    use crate::grid::decode;
    use crate::pipe::Pipe;

    #[test]
    fn validator_accepts_trees_and_rejects_rings() {
        // ┌┐ over ╵╵: three edges on four cells.
        let tree = decode("0110001110001000").unwrap();
        assert!(is_acyclic(&tree, 2));
        // ┌┐ over └┘: the full ring.
        let ring = decode("0110001111001001").unwrap();
        assert!(!is_acyclic(&ring, 2));
    }

    #[test]
    fn pruner_cuts_off_a_forming_ring() {
        let mut csp = pipes_csp(2).unwrap();
        let ids: Vec<_> = csp.var_ids().collect();
        // Three corners of the ring committed; only cell 3 is open.
        csp.assign(ids[0], Pipe::new(false, true, true, false)).unwrap();
        csp.assign(ids[1], Pipe::new(false, false, true, true)).unwrap();
        csp.assign(ids[2], Pipe::new(true, true, false, false)).unwrap();

        let con = csp
            .cons()
            .iter()
            .find(|c| c.name() == "tree")
            .expect("tree constraint")
            .clone();
        let log = con.prune(csp.vars_mut());

        // Cell 3 is claimed from above (cell 1) and from the left
        // (cell 2); accepting both would close the loop.
        assert_eq!(log.len(), 1);
        let (id, removed) = &log[0];
        assert_eq!(*id, ids[3]);
        assert_eq!(removed.as_slice(), &[Pipe::new(true, false, false, true)]);
        assert!(!csp.vars()[ids[3]]
            .active()
            .contains(&Pipe::new(true, false, false, true)));
    }

    #[test]
    fn pruner_is_quiet_without_conflicts() {
        let mut csp = pipes_csp(2).unwrap();
        let ids: Vec<_> = csp.var_ids().collect();
        csp.assign(ids[0], Pipe::new(false, true, true, false)).unwrap();

        let con = csp
            .cons()
            .iter()
            .find(|c| c.name() == "tree")
            .expect("tree constraint")
            .clone();
        assert!(con.prune(csp.vars_mut()).is_empty());
    }
}
