//! Scored move selection for boards under play.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::debug;

use crate::constraint::{is_acyclic, is_connected, no_half_connections};
use crate::grid;
use crate::pipe::Pipe;
use crate::{CancelToken, Error, Result};

/// A fully populated board under play. Unlike the solver's partial
/// assignments, every cell always holds a pipe.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Board {
    n: usize,
    cells: Vec<Pipe>,
}

impl Board {
    /// Wrap a row-major cell vector; the length must be a square in
    /// the supported size range.
    pub fn new(cells: Vec<Pipe>) -> Result<Board> {
        let n = grid::side_len(cells.len()).ok_or_else(|| {
            Error::InvalidEncoding(format!("{} cells do not form a square grid", cells.len()))
        })?;
        if !(2..=25).contains(&n) {
            return Err(Error::SizeOutOfRange(n));
        }
        Ok(Board { n, cells })
    }

    /// Parse a canonical solution string.
    pub fn decode(text: &str) -> Result<Board> {
        Board::new(grid::decode(text)?)
    }

    /// The canonical string for this position.
    pub fn encode(&self) -> String {
        grid::encode(&self.cells)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn cells(&self) -> &[Pipe] {
        &self.cells
    }

    /// Turn one cell a quarter turn clockwise.
    pub fn rotate(&mut self, cell: usize) {
        self.cells[cell] = self.cells[cell].rotated();
    }

    /// Flat 0/1 opening vector: the oracle's input shape and the memo
    /// fingerprint.
    pub fn flatten(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.cells.len() * 4);
        for pipe in &self.cells {
            for open in pipe.openings() {
                out.push(open as u8);
            }
        }
        out
    }

    /// All four puzzle rules hold: matching boundaries everywhere, no
    /// cycle, everything reachable from cell 0.
    pub fn is_solved(&self) -> bool {
        no_half_connections(&self.cells, self.n)
            && is_acyclic(&self.cells, self.n)
            && is_connected(&self.cells, self.n)
    }
}

/// Scores candidate moves for a board position.
///
/// Equal inputs must produce equal outputs within one process lifetime,
/// or the picker's memoization loses its meaning. The picker neither
/// knows nor cares how the scores are produced.
pub trait Oracle {
    /// Map a flat opening vector of length 4n² to one score per
    /// candidate, same length.
    fn score(&self, input: &[f32]) -> Result<Vec<f32>>;
}

/// One proposed rotation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Move {
    /// Rank index into the oracle's score vector.
    pub candidate: usize,
    /// The cell to turn one quarter turn clockwise.
    pub cell: usize,
}

/// Proposes one rotation at a time, never repeating a candidate for
/// the same board position.
pub struct MovePicker<O> {
    oracle: O,
    tried: HashMap<Vec<u8>, HashSet<usize>>,
}

impl<O: Oracle> MovePicker<O> {
    pub fn new(oracle: O) -> Self {
        MovePicker {
            oracle,
            tried: HashMap::new(),
        }
    }

    /// Best untried candidate for `board`: scores sorted descending,
    /// candidates already tried at this position skipped, the winner
    /// remembered.
    ///
    /// The token is honored before the oracle call, after it, and
    /// before the pick is committed; a cancelled pick commits nothing.
    pub fn next_move(&mut self, board: &Board, cancel: &CancelToken) -> Result<Move> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let fingerprint = board.flatten();
        let input: Vec<f32> = fingerprint.iter().map(|&bit| bit as f32).collect();

        let scores = self.oracle.score(&input)?;
        if scores.len() != input.len() {
            return Err(Error::OracleShape {
                expected: input.len(),
                got: scores.len(),
            });
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });

        let tried = self.tried.entry(fingerprint).or_default();
        let candidate = order
            .into_iter()
            .find(|c| !tried.contains(c))
            .ok_or(Error::MovesExhausted)?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tried.insert(candidate);

        let cell = candidate / 4;
        debug!("picked candidate {candidate} (cell {cell})");
        Ok(Move { candidate, cell })
    }
}
