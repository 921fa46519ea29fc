//! Assembles the pipes network for an n×n grid.

use std::rc::Rc;

use log::debug;

use crate::constraint::{Connected, Constraint, HalfConnections, NoCycles, WipePolicy};
use crate::csp::{Csp, VarId, Variable};
use crate::pipe::{Direction, Pipe};
use crate::search::SolveOptions;
use crate::{Error, Result};

/// Smallest supported board.
pub const MIN_SIZE: usize = 2;
/// Largest supported board.
pub const MAX_SIZE: usize = 25;

/// Legal pipes for the cell at (row, col) on an n×n grid: no opening
/// may point off the grid. The enumeration order of [`Pipe::BASE`] is
/// preserved.
pub fn cell_domain(row: usize, col: usize, n: usize) -> Vec<Pipe> {
    Pipe::BASE
        .iter()
        .copied()
        .filter(|p| !(row == 0 && p.opening(Direction::Up)))
        .filter(|p| !(row == n - 1 && p.opening(Direction::Down)))
        .filter(|p| !(col == 0 && p.opening(Direction::Left)))
        .filter(|p| !(col == n - 1 && p.opening(Direction::Right)))
        .collect()
}

/// Build the network for an n×n board: one variable per cell, a
/// half-connection pair per adjacency, and the two global rules.
pub fn pipes_csp(n: usize) -> Result<Csp> {
    if !(MIN_SIZE..=MAX_SIZE).contains(&n) {
        return Err(Error::SizeOutOfRange(n));
    }

    let mut vars = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            vars.push(Variable::new(row * n + col, cell_domain(row, col, n)));
        }
    }

    let mut cons: Vec<Rc<dyn Constraint>> = Vec::new();
    for row in 0..n {
        for col in 0..n - 1 {
            let left = VarId(row * n + col);
            let right = VarId(row * n + col + 1);
            cons.push(Rc::new(HalfConnections::horizontal(left, right)));
        }
    }
    for row in 0..n - 1 {
        for col in 0..n {
            let top = VarId(row * n + col);
            let bottom = VarId((row + 1) * n + col);
            cons.push(Rc::new(HalfConnections::vertical(top, bottom)));
        }
    }

    let everything: Vec<VarId> = (0..n * n).map(VarId).collect();
    cons.push(Rc::new(NoCycles::new(everything.clone(), n)));
    cons.push(Rc::new(Connected::new(everything, n, WipePolicy::default())));

    Ok(Csp::new(format!("pipes {n}x{n}"), vars, cons))
}

/// Generate one solved board as a canonical string, different (with
/// overwhelming likelihood) on every call.
///
/// # Examples
///
/// ```
/// let board = pipes_solver::generate(4).unwrap();
/// assert_eq!(board.len(), 64);
/// ```
pub fn generate(n: usize) -> Result<String> {
    generate_with(n, &SolveOptions::randomized())
}

/// Generate one solved board under explicit options. The solution cap
/// is forced to one; the other options apply as given.
pub fn generate_with(n: usize, opts: &SolveOptions) -> Result<String> {
    let mut csp = pipes_csp(n)?;
    let opts = opts.clone().first_solution();
    match csp.solve_with(&opts).pop() {
        Some(text) => {
            debug!("{}: generated {text}", csp.name());
            Ok(text)
        }
        None if opts.cancel.is_cancelled() => Err(Error::Cancelled),
        None => Err(Error::NoSolution),
    }
}
