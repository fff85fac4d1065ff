//! Move generation
//!
//! One dispatch function per operation over the closed [`Piece`] variant:
//! - [`control_area`] - squares a piece geometrically threatens
//! - [`pseudo_legal_moves`] - destinations ignoring self-check
//! - [`legal_moves`] - destinations that do not leave the mover's king attacked
//!
//! Per-kind tables and rules live in the submodules.

mod attack;
mod bishop;
mod king;
mod knight;
mod pawn;
mod queen;
mod rook;
mod sliding;

pub use attack::{control_squares, is_in_check, is_square_attacked};
pub use king::castling_targets;

use crate::board::Board;
use crate::pieces::Piece;
use crate::types::Square;

/// Squares the piece on `from` threatens, independent of legality
pub fn control_area(board: &Board, from: Square, piece: Piece) -> Vec<Square> {
    let color = piece.color();
    match piece {
        Piece::Pawn { .. } => pawn::control_area(from, color),
        Piece::Knight(_) => knight::control_area(from),
        Piece::Bishop(_) => bishop::control_area(board, from, color),
        Piece::Rook(_) => rook::control_area(board, from, color),
        Piece::Queen(_) => queen::control_area(board, from, color),
        Piece::King(_) => king::control_area(from),
    }
}

/// Destinations allowed by piece geometry and occupancy alone
pub fn pseudo_legal_moves(board: &Board, from: Square, piece: Piece) -> Vec<Square> {
    let color = piece.color();
    match piece {
        Piece::Pawn { .. } => pawn::moves(board, from, piece),
        Piece::Knight(_) => knight::moves(board, from, color),
        Piece::Bishop(_) | Piece::Rook(_) | Piece::Queen(_) => control_area(board, from, piece),
        Piece::King(_) => king::moves(board, from, color),
    }
}

/// Legal destinations for the piece on `from`
///
/// Returns an empty list for an empty or off-board square. Every
/// pseudo-legal destination is simulated and dropped if it would leave the
/// mover's own king attacked.
pub fn legal_moves(board: &Board, from: Square) -> Vec<Square> {
    let Some(piece) = board.piece_at(from) else {
        return Vec::new();
    };
    let color = piece.color();

    pseudo_legal_moves(board, from, piece)
        .into_iter()
        .filter(|&to| !board.puts_in_check(from, to, color))
        .collect()
}
