//! King move generation
//!
//! Kings move one square in any direction (horizontally, vertically, or
//! diagonally), plus castling.
//!
//! ## Castling
//!
//! A castling destination (two columns toward the rook) is offered when:
//! - the king stands on its home square and the side's rights flag is set
//! - the rook is on its home square
//! - every square strictly between king and rook is empty
//! - the king is not in check, and the square it passes over is not attacked
//!
//! Landing in check is rejected by the general self-check filter in
//! [`super::legal_moves`].

use crate::board::Board;
use crate::constants::{
    KINGSIDE_CASTLE_COL, KINGSIDE_ROOK_COL, KING_HOME_COL, KING_OFFSETS, QUEENSIDE_CASTLE_COL,
    QUEENSIDE_ROOK_COL,
};
use crate::pieces::Piece;
use crate::types::{CastleSide, Color, Square};

/// The eight neighbouring squares that are on the board
pub fn control_area(from: Square) -> Vec<Square> {
    KING_OFFSETS
        .iter()
        .filter_map(|&(d_row, d_col)| from.offset(d_row, d_col))
        .collect()
}

/// Generate king moves from a given square, castling included
pub fn moves(board: &Board, from: Square, color: Color) -> Vec<Square> {
    let mut moves: Vec<Square> = control_area(from)
        .into_iter()
        .filter(|&to| !board.occupied_by(to, color))
        .collect();

    moves.extend(castling_targets(board, from, color));
    moves
}

/// Squares the king lands on for each castle currently available
pub fn castling_targets(board: &Board, from: Square, color: Color) -> Vec<Square> {
    let row = color.home_row();
    if from != Square::at(row, KING_HOME_COL) {
        return Vec::new();
    }

    let enemy = color.opposite();
    if board.is_attacked(from, enemy) {
        return Vec::new();
    }

    let rights = board.castling_rights(color);
    let mut targets = Vec::new();

    for side in [CastleSide::Kingside, CastleSide::Queenside] {
        if !rights.allows(side) {
            continue;
        }

        let (rook_col, target_col) = match side {
            CastleSide::Kingside => (KINGSIDE_ROOK_COL, KINGSIDE_CASTLE_COL),
            CastleSide::Queenside => (QUEENSIDE_ROOK_COL, QUEENSIDE_CASTLE_COL),
        };

        if board.piece_at(Square::at(row, rook_col)) != Some(Piece::Rook(color)) {
            continue;
        }

        let (low, high) = if rook_col < KING_HOME_COL {
            (rook_col + 1, KING_HOME_COL)
        } else {
            (KING_HOME_COL + 1, rook_col)
        };
        let path_clear = (low..high).all(|col| !board.is_occupied(Square::at(row, col)));
        if !path_clear {
            continue;
        }

        let step = (rook_col - KING_HOME_COL).signum();
        let transit = Square::at(row, KING_HOME_COL + step);
        if board.is_attacked(transit, enemy) {
            continue;
        }

        targets.push(Square::at(row, target_col));
    }

    targets
}
