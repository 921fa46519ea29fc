//! Variables, the variable arena, and the constraint network.

use std::ops;
use std::rc::Rc;

use bit_set::BitSet;

use crate::constraint::Constraint;
use crate::pipe::Pipe;
use crate::{Error, Result};

/// Arena index of a variable.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VarId(pub(crate) usize);

/// Removals performed by pruners, in the order they happened.
///
/// Undo replays the log by appending each batch back to the end of the
/// owning variable's active domain; survivors keep their relative order.
pub type PruneLog = Vec<(VarId, Vec<Pipe>)>;

/// One grid cell: its full domain, the not-yet-eliminated subset, and
/// the current assignment.
#[derive(Clone, Debug)]
pub struct Variable {
    location: usize,
    domain: Vec<Pipe>,
    active: Vec<Pipe>,
    assignment: Option<Pipe>,
}

impl Variable {
    pub fn new(location: usize, domain: Vec<Pipe>) -> Self {
        let active = domain.clone();
        Variable {
            location,
            domain,
            active,
            assignment: None,
        }
    }

    /// Grid index of the cell this variable stands for.
    pub fn location(&self) -> usize {
        self.location
    }

    /// The full domain, in enumeration order.
    pub fn domain(&self) -> &[Pipe] {
        &self.domain
    }

    /// The values propagation has not eliminated yet.
    pub fn active(&self) -> &[Pipe] {
        &self.active
    }

    pub fn assignment(&self) -> Option<Pipe> {
        self.assignment
    }

    fn prune(&mut self, values: &[Pipe]) {
        self.active.retain(|p| !values.contains(p));
    }

    fn restore(&mut self, values: &[Pipe]) {
        self.active.extend_from_slice(values);
    }
}

/*--------------------------------------------------------------*/

/// The variable arena handed to validators and pruners.
pub struct Vars(Vec<Variable>);

impl Vars {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.0.iter()
    }

    /// Remove `values` from `id`'s active domain, preserving the
    /// relative order of the surviving values.
    pub fn prune(&mut self, id: VarId, values: &[Pipe]) {
        self.0[id.0].prune(values);
    }

    /// The assignment of every variable, in arena order.
    pub fn assignment(&self) -> Result<Vec<Pipe>> {
        self.0
            .iter()
            .map(|var| {
                var.assignment.ok_or(Error::UnassignedVariable {
                    location: var.location,
                })
            })
            .collect()
    }

    /// Assignments where they exist, `None` elsewhere, in arena order.
    pub fn partial_assignment(&self) -> Vec<Option<Pipe>> {
        self.0.iter().map(|var| var.assignment).collect()
    }
}

impl ops::Index<VarId> for Vars {
    type Output = Variable;

    fn index(&self, id: VarId) -> &Variable {
        &self.0[id.0]
    }
}

/*--------------------------------------------------------------*/

/// A named constraint network over a fixed set of variables.
///
/// The network owns every variable and constraint; constraints refer
/// back to variables only through [`VarId`] indices.
pub struct Csp {
    name: String,
    vars: Vars,
    cons: Vec<Rc<dyn Constraint>>,
    // Constraints watching each variable, by index into `cons`.
    wake: Vec<BitSet>,
    assigned: BitSet,
}

impl Csp {
    /// Assemble a network. Every constraint scope must refer to a
    /// variable in `vars`.
    pub fn new(name: impl Into<String>, vars: Vec<Variable>, cons: Vec<Rc<dyn Constraint>>) -> Self {
        let mut wake = vec![BitSet::new(); vars.len()];
        for (cidx, con) in cons.iter().enumerate() {
            for id in con.scope() {
                assert!(id.0 < vars.len(), "constraint scope names an unknown variable");
                wake[id.0].insert(cidx);
            }
        }

        Csp {
            name: name.into(),
            vars: Vars(vars),
            cons,
            wake,
            assigned: BitSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub(crate) fn vars_mut(&mut self) -> &mut Vars {
        &mut self.vars
    }

    pub fn cons(&self) -> &[Rc<dyn Constraint>] {
        &self.cons
    }

    /// Arena ids in arena order.
    pub fn var_ids(&self) -> impl Iterator<Item = VarId> {
        (0..self.vars.len()).map(VarId)
    }

    /// Indices of the constraints watching `id`.
    pub fn wake(&self, id: VarId) -> &BitSet {
        &self.wake[id.0]
    }

    /// Whether every variable carries an assignment.
    pub fn is_complete(&self) -> bool {
        self.assigned.len() == self.vars.len()
    }

    /// Ids of the variables with an assignment.
    pub fn assigned_vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.assigned.iter().map(VarId)
    }

    /// Ids of the variables still open, in arena order.
    pub fn unassigned_vars(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.vars.len())
            .filter(|i| !self.assigned.contains(*i))
            .map(VarId)
    }

    /// Bind `id` to `value`. The value must come from the variable's
    /// full domain; anything else is a caller bug.
    pub fn assign(&mut self, id: VarId, value: Pipe) -> Result<()> {
        let var = &mut self.vars.0[id.0];
        if !var.domain.contains(&value) {
            return Err(Error::ValueNotInDomain {
                location: var.location,
            });
        }
        var.assignment = Some(value);
        self.assigned.insert(id.0);
        Ok(())
    }

    /// Drop `id`'s assignment. Returns whether there was one.
    pub fn unassign(&mut self, id: VarId) -> bool {
        let var = &mut self.vars.0[id.0];
        if var.assignment.take().is_some() {
            self.assigned.remove(id.0);
            true
        } else {
            false
        }
    }

    /// The complete assignment, in arena order.
    pub fn assignment(&self) -> Result<Vec<Pipe>> {
        self.vars.assignment()
    }

    /// Replay a removal log, returning every pruned value to the end of
    /// its active domain.
    pub fn undo(&mut self, log: &PruneLog) {
        for (id, values) in log {
            self.vars.0[id.0].restore(values);
        }
    }
}
