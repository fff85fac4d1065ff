//! Board geometry and movement tables
//!
//! Direction vectors are `(row, col)` deltas. Row 0 is White's back rank
//! (rank 1), column 0 is the a-file.

use crate::pieces::PieceKind;

pub const BOARD_SIZE: i8 = 8;

pub const KING_HOME_COL: i8 = 4;
pub const QUEENSIDE_ROOK_COL: i8 = 0;
pub const KINGSIDE_ROOK_COL: i8 = 7;

/// Columns the king lands on when castling
pub const KINGSIDE_CASTLE_COL: i8 = 6;
pub const QUEENSIDE_CASTLE_COL: i8 = 2;

/// Columns the rook lands on after the hop
pub const KINGSIDE_ROOK_TARGET_COL: i8 = 5;
pub const QUEENSIDE_ROOK_TARGET_COL: i8 = 3;

pub const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
pub const BISHOP_DIRS: [(i8, i8); 4] = [(1, -1), (1, 1), (-1, -1), (-1, 1)];
pub const QUEEN_DIRS: [(i8, i8); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, -1),
    (1, 1),
    (-1, -1),
    (-1, 1),
];

pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, -1),
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, -1),
    (-2, 1),
    (1, -2),
    (-1, -2),
];

pub const KING_OFFSETS: [(i8, i8); 8] = QUEEN_DIRS;

/// Back rank layout from the a-file to the h-file
pub const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Match ids are drawn from this URL-safe alphabet
pub const MATCH_ID_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
pub const MATCH_ID_LEN: usize = 20;

pub const STANDARD_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq";
