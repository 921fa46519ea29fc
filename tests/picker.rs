//! End-to-end checks for the move picker.

use pipes_solver::*;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/*--------------------------------------------------------------*/

// Ranks candidates purely by position: lower index, higher score.
struct ByIndex;

impl Oracle for ByIndex {
    fn score(&self, input: &[f32]) -> Result<Vec<f32>> {
        Ok((0..input.len()).map(|i| -(i as f32)).collect())
    }
}

// A best-effort inverse: favors every candidate of each cell that
// still differs from the board it was trained toward.
struct TowardTarget {
    target: Vec<Pipe>,
}

impl Oracle for TowardTarget {
    fn score(&self, input: &[f32]) -> Result<Vec<f32>> {
        let mut scores = vec![0.0f32; input.len()];
        for (cell, pipe) in self.target.iter().enumerate() {
            let openings = pipe.openings();
            let mismatch = (0..4).any(|d| (input[cell * 4 + d] > 0.5) != openings[d]);
            if mismatch {
                for d in 0..4 {
                    scores[cell * 4 + d] = 1.0;
                }
            }
        }
        Ok(scores)
    }
}

fn solved_board(n: usize, seed: u64) -> Board {
    let text = generate_with(n, &SolveOptions::seeded(seed)).expect("a solved board");
    Board::decode(&text).expect("decodable")
}

/*--------------------------------------------------------------*/

#[test]
fn a_move_on_a_solved_board_breaks_it() {
    let board = solved_board(2, 5);
    assert!(board.is_solved());

    let mut picker = MovePicker::new(ByIndex);
    let mv = picker.next_move(&board, &CancelToken::new()).expect("a move");

    let mut played = board.clone();
    played.rotate(mv.cell);
    assert!(!played.is_solved());
}

#[test]
fn repeat_picks_for_one_position_differ() {
    let mut scrambled = solved_board(3, 9);
    scrambled.rotate(0);
    scrambled.rotate(4);

    let mut picker = MovePicker::new(ByIndex);
    let cancel = CancelToken::new();
    let first = picker.next_move(&scrambled, &cancel).unwrap();
    let second = picker.next_move(&scrambled, &cancel).unwrap();
    assert_ne!(first.candidate, second.candidate);
}

#[test]
fn the_memo_is_kept_per_position() {
    let board = solved_board(2, 5);
    let mut other = board.clone();
    other.rotate(3);

    let mut picker = MovePicker::new(ByIndex);
    let cancel = CancelToken::new();
    assert_eq!(picker.next_move(&board, &cancel).unwrap().candidate, 0);
    // A different position starts from its own clean slate.
    assert_eq!(picker.next_move(&other, &cancel).unwrap().candidate, 0);
    // Back on the first position, candidate 0 is spent.
    assert_eq!(picker.next_move(&board, &cancel).unwrap().candidate, 1);
}

#[test]
fn the_picker_unscrambles_a_4x4_board() {
    let solved = solved_board(4, 42);

    let mut rng = StdRng::seed_from_u64(7);
    let mut board = solved.clone();
    for cell in 0..board.cells().len() {
        for _ in 0..rng.gen_range(0..4) {
            board.rotate(cell);
        }
    }

    let mut picker = MovePicker::new(TowardTarget {
        target: solved.cells().to_vec(),
    });
    let cancel = CancelToken::new();

    let mut steps = 0;
    while !board.is_solved() {
        let mv = picker.next_move(&board, &cancel).expect("an untried move");
        board.rotate(mv.cell);
        steps += 1;
        assert!(steps <= 500, "picker failed to converge");
    }
    println!("unscrambled in {} step(s)", steps);
    assert!(board.is_solved());
}

#[test]
fn boards_reject_non_square_input() {
    assert!(Board::new(vec![Pipe::new(true, false, false, false); 5]).is_err());
    assert!(matches!(
        Board::new(vec![Pipe::new(true, false, false, false); 1]),
        Err(Error::SizeOutOfRange(1))
    ));
}
