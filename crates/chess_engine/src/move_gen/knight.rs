//! Knight move generation
//!
//! Handles knight-specific move generation. Knights move in an L-shape pattern:
//! 2 squares in one direction, then 1 square perpendicular (or vice versa).
//!
//! ## Knight Movement Rules
//!
//! - Knights can jump over pieces (unlike sliding pieces)
//! - 8 possible destinations from most squares (fewer near edges)
//! - Cannot move to squares occupied by own pieces
//! - Can capture opponent pieces on destination squares

use crate::board::Board;
use crate::constants::KNIGHT_OFFSETS;
use crate::types::{Color, Square};

/// Every in-bounds L-jump from `from`, occupied or not
pub fn control_area(from: Square) -> Vec<Square> {
    KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(d_row, d_col)| from.offset(d_row, d_col))
        .collect()
}

/// Generate knight moves from a given square
///
/// Filters the control area, removing squares occupied by own pieces.
pub fn moves(board: &Board, from: Square, color: Color) -> Vec<Square> {
    control_area(from)
        .into_iter()
        .filter(|&to| !board.occupied_by(to, color))
        .collect()
}
