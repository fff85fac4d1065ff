//! Bishop move generation
//!
//! Bishops are sliding pieces that move diagonally until blocked by another
//! piece or the board edge. They cannot jump, and capture on the square
//! that blocks them.

use super::sliding;
use crate::board::Board;
use crate::constants::BISHOP_DIRS;
use crate::types::{Color, Square};

/// Squares a bishop on `from` threatens
pub fn control_area(board: &Board, from: Square, color: Color) -> Vec<Square> {
    sliding::ray_squares(board, from, color, &BISHOP_DIRS)
}
