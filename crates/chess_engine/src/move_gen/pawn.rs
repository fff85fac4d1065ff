//! Pawn move generation
//!
//! Handles pawn-specific move generation including:
//! - Single and double forward pushes
//! - Diagonal captures
//! - Promotion (chosen by the mover, applied by the board)
//!
//! ## Pawn Movement Rules
//!
//! - **Forward push**: one square toward the opponent, only onto an empty square
//! - **Double push**: from an unmoved pawn, two squares, both empty
//! - **Captures**: diagonally forward, only onto an enemy-occupied square
//!
//! The diagonal squares are *controlled* even when empty. They count for
//! check detection but are not moves. En passant is not supported.

use crate::board::Board;
use crate::pieces::Piece;
use crate::types::{Color, Square};

/// The two forward diagonals, whether occupied or not
pub fn control_area(from: Square, color: Color) -> Vec<Square> {
    let forward = color.forward();
    [-1, 1]
        .into_iter()
        .filter_map(|d_col| from.offset(forward, d_col))
        .collect()
}

/// Generate pawn moves from a given square
///
/// # Arguments
///
/// * `board` - The current board
/// * `from` - Square the pawn stands on
/// * `pawn` - The pawn itself; its `moved` flag gates the double step
pub fn moves(board: &Board, from: Square, pawn: Piece) -> Vec<Square> {
    let color = pawn.color();
    let forward = color.forward();
    let mut moves = Vec::new();

    if let Some(single) = from.offset(forward, 0) {
        if !board.is_occupied(single) {
            moves.push(single);

            let unmoved = matches!(pawn, Piece::Pawn { moved: false, .. });
            if unmoved {
                if let Some(double) = single.offset(forward, 0) {
                    if !board.is_occupied(double) {
                        moves.push(double);
                    }
                }
            }
        }
    }

    let enemy = color.opposite();
    moves.extend(
        control_area(from, color)
            .into_iter()
            .filter(|&to| board.occupied_by(to, enemy)),
    );

    moves
}
