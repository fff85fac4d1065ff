//! Queen move generation
//!
//! The queen combines rook and bishop movement: eight sliding directions.

use super::sliding;
use crate::board::Board;
use crate::constants::QUEEN_DIRS;
use crate::types::{Color, Square};

/// Squares a queen on `from` threatens
pub fn control_area(board: &Board, from: Square, color: Color) -> Vec<Square> {
    sliding::ray_squares(board, from, color, &QUEEN_DIRS)
}
