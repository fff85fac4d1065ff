//! Sliding piece move generation
//!
//! Common functionality for sliding pieces (bishops, rooks, queens).
//! These pieces can move multiple squares in a direction until blocked.
//!
//! ## Algorithm
//!
//! For each direction vector we step outward from the source square:
//! 1. Empty squares are added and the ray continues
//! 2. An opponent piece is added (capture) and the ray stops
//! 3. An own piece stops the ray without being added
//! 4. Leaving the board stops the ray

use crate::board::Board;
use crate::types::{Color, Square};

/// Ray-cast along every direction in `dirs`
///
/// The result is both the control area and the pseudo-legal destination
/// set of a slider: own-occupied squares are never included.
///
/// # Arguments
///
/// * `board` - The current board
/// * `from` - Square the slider stands on
/// * `color` - Color of the slider
/// * `dirs` - `(row, col)` direction vectors
pub fn ray_squares(board: &Board, from: Square, color: Color, dirs: &[(i8, i8)]) -> Vec<Square> {
    let mut squares = Vec::new();

    for &(d_row, d_col) in dirs {
        let mut current = from;
        while let Some(next) = current.offset(d_row, d_col) {
            match board.piece_at(next) {
                None => squares.push(next),
                Some(piece) => {
                    if piece.color() != color {
                        squares.push(next);
                    }
                    break;
                }
            }
            current = next;
        }
    }

    squares
}
