//! The full-connectivity rule.

use crate::csp::{PruneLog, VarId, Vars};
use crate::grid;
use crate::pipe::{Direction, Pipe};
use crate::Result;

use super::{scope_assignment, Constraint};

/// Whether a traversal from cell 0 over mutual connections reaches
/// every cell.
pub fn is_connected(board: &[Pipe], n: usize) -> bool {
    let mut visited = vec![false; board.len()];
    let mut stack = vec![0usize];
    visited[0] = true;
    let mut seen = 1;

    while let Some(cell) = stack.pop() {
        let adjacent = grid::neighbors(cell, n);
        let linked = grid::connections(board[cell], grid::adjacent(board, cell, n));
        for d in 0..4 {
            if !linked[d] {
                continue;
            }
            let Some(next) = adjacent[d] else { continue };
            if !visited[next] {
                visited[next] = true;
                seen += 1;
                stack.push(next);
            }
        }
    }
    seen == board.len()
}

/// Which open variable takes the forced wipe-out when the
/// over-approximated board can no longer be connected.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum WipePolicy {
    /// Lowest location first.
    #[default]
    FirstUnassigned,
    /// Smallest active domain first.
    SmallestDomain,
}

/// Every cell must end up reachable from cell 0.
///
/// The pruner reasons over a best-case board: committed cells keep
/// their pipe, open cells pretend to open wherever any of their active
/// values still could. If even that board falls apart, the node is
/// hopeless; otherwise dead-end corridors pin down the openings of the
/// open cells along them.
pub struct Connected {
    name: String,
    scope: Vec<VarId>,
    n: usize,
    policy: WipePolicy,
}

impl Connected {
    pub fn new(scope: Vec<VarId>, n: usize, policy: WipePolicy) -> Self {
        Connected {
            name: "connected".to_string(),
            scope,
            n,
            policy,
        }
    }
}

impl Constraint for Connected {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> &[VarId] {
        &self.scope
    }

    fn satisfied(&self, vars: &Vars) -> Result<bool> {
        let board = scope_assignment(&self.name, &self.scope, vars)?;
        Ok(is_connected(&board, self.n))
    }

    fn prune(&self, vars: &mut Vars) -> PruneLog {
        let mut best: Vec<Pipe> = Vec::with_capacity(vars.len());
        let mut open: Vec<usize> = Vec::new();
        for var in vars.iter() {
            match var.assignment() {
                Some(pipe) => best.push(pipe),
                None => {
                    open.push(var.location());
                    let union = var
                        .active()
                        .iter()
                        .fold(Pipe::new(false, false, false, false), |acc, p| acc.union(*p));
                    best.push(union);
                }
            }
        }
        if open.is_empty() {
            return PruneLog::new();
        }

        if !is_connected(&best, self.n) {
            // No extension can reconnect the grid; empty one active
            // domain so the search backtracks out of this node.
            let target = match self.policy {
                WipePolicy::FirstUnassigned => open[0],
                WipePolicy::SmallestDomain => open
                    .iter()
                    .copied()
                    .min_by_key(|&loc| vars[VarId(loc)].active().len())
                    .unwrap_or(open[0]),
            };
            let id = VarId(target);
            let doomed = vars[id].active().to_vec();
            if doomed.is_empty() {
                return PruneLog::new();
            }
            vars.prune(id, &doomed);
            return vec![(id, doomed)];
        }

        self.prune_dead_ends(vars, &best)
    }
}

impl Connected {
    /// A best-case degree-1 cell can only reach the rest of the grid
    /// through its single live neighbor. Walking that corridor, every
    /// open cell must keep facing the way back, or the tail behind it
    /// is orphaned.
    fn prune_dead_ends(&self, vars: &mut Vars, best: &[Pipe]) -> PruneLog {
        let n = self.n;
        let degree: Vec<usize> = (0..best.len())
            .map(|cell| {
                grid::connections(best[cell], grid::adjacent(best, cell, n))
                    .iter()
                    .filter(|&&linked| linked)
                    .count()
            })
            .collect();

        let mut log = PruneLog::new();
        for start in 0..best.len() {
            if degree[start] != 1 {
                continue;
            }
            let mut prev = start;
            let Some(mut cell) = linked_neighbor(best, start, n, usize::MAX) else {
                continue;
            };

            let mut steps = 0;
            loop {
                steps += 1;
                if steps > best.len() {
                    break;
                }
                if vars[VarId(cell)].assignment().is_none() {
                    if let Some(back) = direction_toward(cell, prev, n) {
                        let doomed: Vec<Pipe> = vars[VarId(cell)]
                            .active()
                            .iter()
                            .copied()
                            .filter(|p| !p.opening(back))
                            .collect();
                        if !doomed.is_empty() {
                            vars.prune(VarId(cell), &doomed);
                            log.push((VarId(cell), doomed));
                        }
                    }
                }
                if degree[cell] != 2 {
                    break;
                }
                let Some(next) = linked_neighbor(best, cell, n, prev) else {
                    break;
                };
                prev = cell;
                cell = next;
            }
        }
        log
    }
}

/// The first connected neighbor of `cell` other than `skip`.
fn linked_neighbor(board: &[Pipe], cell: usize, n: usize, skip: usize) -> Option<usize> {
    let adjacent = grid::neighbors(cell, n);
    let linked = grid::connections(board[cell], grid::adjacent(board, cell, n));
    for d in 0..4 {
        if !linked[d] {
            continue;
        }
        if let Some(next) = adjacent[d] {
            if next != skip {
                return Some(next);
            }
        }
    }
    None
}

/// The direction from `cell` toward the adjacent `target`.
fn direction_toward(cell: usize, target: usize, n: usize) -> Option<Direction> {
    let adjacent = grid::neighbors(cell, n);
    Direction::ALL
        .into_iter()
        .find(|dir| adjacent[dir.index()] == Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::pipes_csp;
    use crate::grid::decode;
    use crate::pipe::Pipe;

    fn connected_con(csp: &crate::csp::Csp) -> std::rc::Rc<dyn Constraint> {
        csp.cons()
            .iter()
            .find(|c| c.name() == "connected")
            .expect("connected constraint")
            .clone()
    }

    #[test]
    fn validator_counts_reachable_cells() {
        // ┌┐ over ╵╵: every cell hangs off the top pair.
        let tree = decode("0110001110001000").unwrap();
        assert!(is_connected(&tree, 2));
        // ╶╴ over ╶╴: two separate dominoes.
        let split = decode("0100000101000001").unwrap();
        assert!(!is_connected(&split, 2));
    }

    #[test]
    fn pruner_wipes_a_domain_when_the_grid_is_split() {
        let mut csp = pipes_csp(2).unwrap();
        let ids: Vec<_> = csp.var_ids().collect();
        // The top pair joins left-right only: nothing can ever reach the
        // bottom row, whatever its cells become.
        csp.assign(ids[0], Pipe::new(false, true, false, false)).unwrap();
        csp.assign(ids[1], Pipe::new(false, false, false, true)).unwrap();

        let before = csp.vars()[ids[2]].active().to_vec();
        let log = connected_con(&csp).prune(csp.vars_mut());

        assert_eq!(log.len(), 1);
        let (id, removed) = &log[0];
        assert_eq!(*id, ids[2]);
        assert_eq!(removed.as_slice(), before.as_slice());
        assert!(csp.vars()[ids[2]].active().is_empty());
    }

    #[test]
    fn pruner_pins_corridor_cells_toward_the_dead_end() {
        let mut csp = pipes_csp(3).unwrap();
        let ids: Vec<_> = csp.var_ids().collect();
        // Cell 0 opens right only: under the best case it is a dead end
        // whose single exit runs through cell 1.
        csp.assign(ids[0], Pipe::new(false, true, false, false)).unwrap();

        let log = connected_con(&csp).prune(csp.vars_mut());

        assert_eq!(log.len(), 1);
        let (id, removed) = &log[0];
        assert_eq!(*id, ids[1]);
        assert!(removed.iter().all(|p| !p.opening(Direction::Left)));
        assert!(csp.vars()[ids[1]]
            .active()
            .iter()
            .all(|p| p.opening(Direction::Left)));
    }

    #[test]
    fn pruner_is_quiet_on_a_fresh_board() {
        let mut csp = pipes_csp(3).unwrap();
        let log = connected_con(&csp).prune(csp.vars_mut());
        assert!(log.is_empty());
    }
}
