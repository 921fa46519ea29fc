//! Constraint-queue propagation.

use std::collections::VecDeque;

use bit_set::BitSet;
use log::trace;

use crate::csp::{Csp, PruneLog};

/// Drive the pruners to a fixpoint, starting from the `seed` constraint
/// indices.
///
/// Every removal is recorded in the returned log so the caller can undo
/// it. Whenever a variable's active domain shrinks, the constraints
/// watching it rejoin the queue. The call returns as soon as some
/// active domain empties; the caller detects the wipe-out from the log.
pub fn propagate(csp: &mut Csp, seed: impl IntoIterator<Item = usize>) -> PruneLog {
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut queued = BitSet::with_capacity(csp.cons().len());
    for cidx in seed {
        if queued.insert(cidx) {
            queue.push_back(cidx);
        }
    }

    let mut log = PruneLog::new();
    while let Some(cidx) = queue.pop_front() {
        queued.remove(cidx);
        let con = csp.cons()[cidx].clone();
        let removed = con.prune(csp.vars_mut());

        for (id, values) in removed {
            if values.is_empty() {
                continue;
            }
            trace!(
                "`{}` pruned {} value(s) from cell {}",
                con.name(),
                values.len(),
                csp.vars()[id].location()
            );
            log.push((id, values));

            if csp.vars()[id].active().is_empty() {
                return log;
            }
            for watcher in csp.wake(id).iter() {
                if queued.insert(watcher) {
                    queue.push_back(watcher);
                }
            }
        }
    }
    log
}
