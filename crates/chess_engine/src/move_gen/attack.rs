//! Attack detection and square checking
//!
//! Provides functions to check if squares are under attack and if kings are in check.
//! This module is critical for move legality validation and check detection.
//!
//! ## Algorithm
//!
//! A square is attacked when it lies in the control area of any piece of
//! the attacking color. Control areas ignore legality: an empty pawn
//! diagonal is controlled, and a pinned piece still controls its squares.

use super::control_area;
use crate::board::Board;
use crate::types::{Color, Square};

/// Check if a square is under attack by pieces of the specified color
///
/// # Examples
///
/// ```
/// use chess_engine::{Board, Color, Square};
///
/// let board = Board::standard();
/// // f3 is covered by White's g1 knight and e2/g2 pawns
/// assert!(board.is_attacked(Square::at(2, 5), Color::White));
/// assert!(!board.is_attacked(Square::at(3, 4), Color::White));
/// ```
pub fn is_square_attacked(board: &Board, square: Square, by_color: Color) -> bool {
    board
        .pieces(by_color)
        .any(|(from, piece)| control_area(board, from, piece).contains(&square))
}

/// Union (with repeats) of every control area of `color`'s pieces
pub fn control_squares(board: &Board, color: Color) -> Vec<Square> {
    board
        .pieces(color)
        .flat_map(|(from, piece)| control_area(board, from, piece))
        .collect()
}

/// Check if the king of a given color is in check
pub fn is_in_check(board: &Board, color: Color) -> bool {
    is_square_attacked(board, board.king_square(color), color.opposite())
}
