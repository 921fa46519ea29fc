//! Backtracking search with frontier-guided variable ordering.

use std::collections::HashSet;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::csp::{Csp, PruneLog, VarId};
use crate::grid;
use crate::pipe::Pipe;
use crate::propagate::propagate;
use crate::CancelToken;

/// Knobs for one solve run.
#[derive(Clone, Debug, Default)]
pub struct SolveOptions {
    /// Stop after this many solutions; `None` collects all of them.
    pub max_solutions: Option<usize>,
    /// Shuffle value order and break variable-ordering ties at random.
    pub randomize: bool,
    /// Seed for the randomized mode; fresh entropy when `None`.
    pub seed: Option<u64>,
    /// Cooperative cancellation, checked once per search step.
    pub cancel: CancelToken,
}

impl SolveOptions {
    /// Fixed variable and value order: repeat runs agree exactly.
    pub fn deterministic() -> Self {
        SolveOptions::default()
    }

    /// Entropy-seeded value shuffling for varied boards.
    pub fn randomized() -> Self {
        SolveOptions {
            randomize: true,
            ..SolveOptions::default()
        }
    }

    /// Randomized but reproducible.
    pub fn seeded(seed: u64) -> Self {
        SolveOptions {
            randomize: true,
            seed: Some(seed),
            ..SolveOptions::default()
        }
    }

    /// Stop at the first solution.
    pub fn first_solution(mut self) -> Self {
        self.max_solutions = Some(1);
        self
    }
}

// One open variable under trial: the values captured when the frame
// was pushed, a cursor into them, and the removals of the live trial.
struct Frame {
    var: VarId,
    values: Vec<Pipe>,
    cursor: usize,
    log: PruneLog,
}

impl Csp {
    /// Find one solution in deterministic order.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut csp = pipes_solver::pipes_csp(2).unwrap();
    /// assert!(csp.solve_any().is_some());
    /// ```
    pub fn solve_any(&mut self) -> Option<String> {
        self.solve_with(&SolveOptions::deterministic().first_solution())
            .pop()
    }

    /// Find every solution in deterministic order.
    pub fn solve_all(&mut self) -> Vec<String> {
        self.solve_with(&SolveOptions::deterministic())
    }

    /// Run the search with explicit options. Solutions come back as
    /// canonical strings, duplicates suppressed. The network is left
    /// exactly as it was found, whatever ends the run.
    pub fn solve_with(&mut self, opts: &SolveOptions) -> Vec<String> {
        search(self, opts)
    }
}

fn search(csp: &mut Csp, opts: &SolveOptions) -> Vec<String> {
    let mut rng = if opts.randomize {
        Some(match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        })
    } else {
        None
    };

    let cap = opts.max_solutions.unwrap_or(usize::MAX);
    let mut found: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut nodes: u64 = 0;

    if cap == 0 || csp.vars().is_empty() {
        return found;
    }
    // Handed a finished assignment: there is nothing to search, only
    // the validator sweep to run.
    if csp.is_complete() {
        if let Ok(board) = csp.assignment() {
            if validate(csp) {
                found.push(grid::encode(&board));
            }
        }
        return found;
    }

    let mut stack = Vec::new();
    let first = select_variable(csp, rng.as_mut());
    stack.push(open_frame(csp, first, rng.as_mut()));

    while let Some(top) = stack.last_mut() {
        if found.len() >= cap || opts.cancel.is_cancelled() {
            unwind(csp, &mut stack);
            break;
        }

        // A full assignment: double-check it against every validator,
        // record it, and fall back to the next value of this frame.
        if csp.is_complete() {
            match csp.assignment() {
                Ok(board) => {
                    if validate(csp) {
                        let text = grid::encode(&board);
                        if seen.insert(text.clone()) {
                            found.push(text);
                        }
                    }
                }
                Err(err) => warn!("{}: complete node without assignment: {err}", csp.name()),
            }
            csp.undo(&top.log);
            top.log.clear();
            top.cursor += 1;
            continue;
        }

        // This frame has run dry: drop it and move its parent along.
        if top.cursor >= top.values.len() {
            let done = match stack.pop() {
                Some(frame) => frame,
                None => break,
            };
            csp.unassign(done.var);
            if let Some(parent) = stack.last_mut() {
                csp.undo(&parent.log);
                parent.log.clear();
                csp.unassign(parent.var);
                parent.cursor += 1;
            }
            continue;
        }

        // Try the value under the cursor.
        nodes += 1;
        let var = top.var;
        let value = top.values[top.cursor];
        csp.unassign(var);
        if let Err(err) = csp.assign(var, value) {
            warn!("{}: skipping untriable value: {err}", csp.name());
            if let Some(top) = stack.last_mut() {
                top.cursor += 1;
            }
            continue;
        }

        let seed: Vec<usize> = csp.wake(var).iter().collect();
        let log = propagate(csp, seed);
        let wiped = log
            .iter()
            .any(|(id, _)| csp.vars()[*id].active().is_empty());
        let top = match stack.last_mut() {
            Some(top) => top,
            None => break,
        };
        top.log = log;

        if wiped {
            csp.undo(&top.log);
            top.log.clear();
            top.cursor += 1;
            continue;
        }

        // That was the last open variable: nothing to descend into, the
        // completeness branch at the top of the loop takes it from here.
        if csp.is_complete() {
            continue;
        }

        let next = select_variable(csp, rng.as_mut());
        let frame = open_frame(csp, next, rng.as_mut());
        stack.push(frame);
    }

    debug!(
        "{}: search visited {nodes} node(s), found {} solution(s)",
        csp.name(),
        found.len()
    );
    found
}

/// Run every validator over the complete assignment. Propagation is
/// meant to make this a formality, so a rejection is worth a warning.
fn validate(csp: &Csp) -> bool {
    for con in csp.cons() {
        match con.satisfied(csp.vars()) {
            Ok(true) => {}
            Ok(false) => {
                debug!("{}: `{}` rejected a complete assignment", csp.name(), con.name());
                return false;
            }
            Err(err) => {
                warn!("{}: `{}` failed on a complete node: {err}", csp.name(), con.name());
                return false;
            }
        }
    }
    true
}

fn open_frame(csp: &Csp, var: VarId, rng: Option<&mut StdRng>) -> Frame {
    let mut values = csp.vars()[var].active().to_vec();
    if let Some(rng) = rng {
        values.shuffle(rng);
    }
    Frame {
        var,
        values,
        cursor: 0,
        log: PruneLog::new(),
    }
}

fn unwind(csp: &mut Csp, stack: &mut Vec<Frame>) {
    while let Some(frame) = stack.pop() {
        csp.undo(&frame.log);
        csp.unassign(frame.var);
    }
}

/// Pick the open variable nearest (by Manhattan distance) to the
/// frontier: the open cells adjacent to the committed region.
///
/// Ties break by location order, or uniformly at random when an `rng`
/// is supplied. With nothing committed yet every cell ties.
fn select_variable(csp: &Csp, mut rng: Option<&mut StdRng>) -> VarId {
    let cells = csp.vars().len();
    let n = match grid::side_len(cells) {
        Some(n) => n,
        // Not a square board: geometry means nothing, take the first.
        None => {
            return csp
                .unassigned_vars()
                .next()
                .unwrap_or(VarId(0));
        }
    };

    let mut committed = vec![false; cells];
    for id in csp.assigned_vars() {
        committed[csp.vars()[id].location()] = true;
    }

    let mut frontier: Vec<usize> = Vec::new();
    let mut on_frontier = vec![false; cells];
    for id in csp.assigned_vars() {
        for neighbor in grid::neighbors(csp.vars()[id].location(), n).into_iter().flatten() {
            if !committed[neighbor] && !on_frontier[neighbor] {
                on_frontier[neighbor] = true;
                frontier.push(neighbor);
            }
        }
    }

    let far = 2 * n;
    let mut best_dist = usize::MAX;
    let mut ties: Vec<VarId> = Vec::new();
    for id in csp.unassigned_vars() {
        let loc = csp.vars()[id].location();
        let (row, col) = (loc / n, loc % n);
        let dist = frontier
            .iter()
            .map(|&f| row.abs_diff(f / n) + col.abs_diff(f % n))
            .min()
            .unwrap_or(far);
        if dist < best_dist {
            best_dist = dist;
            ties.clear();
        }
        if dist == best_dist {
            ties.push(id);
            // Nothing beats distance zero; in deterministic mode the
            // first hit settles the tie as well.
            if dist == 0 && rng.is_none() {
                break;
            }
        }
    }

    debug_assert!(
        !ties.is_empty(),
        "select_variable called with every variable assigned"
    );
    match rng.as_deref_mut() {
        Some(rng) => ties[rng.gen_range(0..ties.len())],
        None => ties[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::pipes_csp;
    use crate::pipe::Pipe;

    #[test]
    fn heuristic_follows_the_frontier() {
        let mut csp = pipes_csp(3).unwrap();
        let ids: Vec<_> = csp.var_ids().collect();

        // Nothing committed: the lowest location wins.
        assert_eq!(select_variable(&csp, None), ids[0]);

        // Commit the far corner: its two neighbors are the frontier.
        csp.assign(ids[8], Pipe::new(true, false, false, true)).unwrap();
        assert_eq!(select_variable(&csp, None), ids[5]);
    }

    #[test]
    fn solver_state_is_clean_after_a_run() {
        let mut csp = pipes_csp(2).unwrap();
        let solutions = csp.solve_all();
        assert!(!solutions.is_empty());
        assert_eq!(csp.unassigned_vars().count(), 4);
        for id in csp.var_ids() {
            assert_eq!(
                csp.vars()[id].active().len(),
                csp.vars()[id].domain().len()
            );
        }
        // And the same network solves again to the same answer.
        assert_eq!(csp.solve_all(), solutions);
    }
}
