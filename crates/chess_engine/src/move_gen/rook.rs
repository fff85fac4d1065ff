//! Rook move generation
//!
//! Rooks slide along ranks and files. Castling is driven by the king
//! (see `king.rs`); the rook only takes part through the board's rook hop.

use super::sliding;
use crate::board::Board;
use crate::constants::ROOK_DIRS;
use crate::types::{Color, Square};

/// Squares a rook on `from` threatens
pub fn control_area(board: &Board, from: Square, color: Color) -> Vec<Square> {
    sliding::ray_squares(board, from, color, &ROOK_DIRS)
}
