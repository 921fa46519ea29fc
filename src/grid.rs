//! Index arithmetic, connection tests, and board encoding for the
//! square grid.

use crate::pipe::{Direction, Pipe};
use crate::{Error, Result};

/// Neighbor indices of `center` on an n×n grid, in direction order.
/// `None` marks a side that leaves the grid; indices never wrap.
pub fn neighbors(center: usize, n: usize) -> [Option<usize>; 4] {
    let row = center / n;
    let col = center % n;
    [
        (row > 0).then(|| center - n),
        (col + 1 < n).then(|| center + 1),
        (row + 1 < n).then(|| center + n),
        (col > 0).then(|| center - 1),
    ]
}

/// Mutual-opening test between a cell and its four neighbors.
///
/// `connections[d]` holds only when the center opens toward `d` and the
/// neighbor on that side opens back; a one-sided opening never counts.
pub fn connections(center: Pipe, adjacent: [Option<Pipe>; 4]) -> [bool; 4] {
    let mut out = [false; 4];
    for dir in Direction::ALL {
        let d = dir.index();
        if center.opening(dir) {
            if let Some(other) = adjacent[d] {
                out[d] = other.opening(dir.opposite());
            }
        }
    }
    out
}

/// The pipes around `center` in a fully populated board.
pub fn adjacent(board: &[Pipe], center: usize, n: usize) -> [Option<Pipe>; 4] {
    neighbors(center, n).map(|i| i.map(|i| board[i]))
}

/// The pipes around `center` in a partially assigned board; unassigned
/// cells count the same as off-grid ones.
pub fn adjacent_partial(board: &[Option<Pipe>], center: usize, n: usize) -> [Option<Pipe>; 4] {
    neighbors(center, n).map(|i| i.and_then(|i| board[i]))
}

/// Side length for a cell count, if the count is a perfect square.
pub fn side_len(cells: usize) -> Option<usize> {
    let n = (cells as f64).sqrt().round() as usize;
    (n * n == cells).then_some(n)
}

/// Row-major concatenation of the canonical pipe encodings.
pub fn encode(board: &[Pipe]) -> String {
    let mut out = String::with_capacity(board.len() * 4);
    for pipe in board {
        pipe.encode_into(&mut out);
    }
    out
}

/// Parse a canonical solution string back into a board. The side length
/// is recovered from the string length and must land in 2..=25.
pub fn decode(text: &str) -> Result<Vec<Pipe>> {
    if !text.is_ascii() {
        return Err(Error::InvalidEncoding(
            "non-ASCII characters in board string".to_string(),
        ));
    }
    if text.len() % 4 != 0 {
        return Err(Error::InvalidEncoding(format!(
            "length {} is not a multiple of 4",
            text.len()
        )));
    }
    let cells = text.len() / 4;
    let n = side_len(cells).ok_or_else(|| {
        Error::InvalidEncoding(format!("{cells} cells do not form a square grid"))
    })?;
    if !(2..=25).contains(&n) {
        return Err(Error::SizeOutOfRange(n));
    }
    let mut board = Vec::with_capacity(cells);
    for i in 0..cells {
        board.push(Pipe::decode(&text[i * 4..i * 4 + 4])?);
    }
    Ok(board)
}

/// Multi-line glyph rendering of a board, one text row per grid row.
pub fn render(board: &[Pipe], n: usize) -> String {
    let mut out = String::with_capacity(board.len() + n);
    for (i, pipe) in board.iter().enumerate() {
        out.push(pipe.glyph());
        if i % n == n - 1 {
            out.push('\n');
        }
    }
    out
}
