//! Core value types shared by the board, the pieces and the game layer
//!
//! Provides newtype patterns and trait implementations for chess-specific types
//! to improve type safety and code clarity:
//! - [`Color`] and [`Square`] coordinates with algebraic notation
//! - [`Move`] requests and [`MoveRecord`] history entries
//! - [`CastlingRights`] and the terminal [`GameStatus`]
//! - [`MatchId`] / [`Identity`] opaque string identifiers

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_SIZE, MATCH_ID_CHARSET, MATCH_ID_LEN};
use crate::error::ChessEngineError;
use crate::pieces::{PieceKind, PromotionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Index into per-color arrays (0 = White, 1 = Black)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Row holding this color's king and rooks at the start
    #[inline]
    pub fn home_row(self) -> i8 {
        match self {
            Color::White => 0,
            Color::Black => BOARD_SIZE - 1,
        }
    }

    /// Row this color's pawns start on
    #[inline]
    pub fn pawn_row(self) -> i8 {
        self.home_row() + self.forward()
    }

    /// Row delta of a pawn push
    #[inline]
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Farthest row from this color's start, where pawns promote
    #[inline]
    pub fn promotion_row(self) -> i8 {
        self.opposite().home_row()
    }

    pub fn tag(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    pub fn from_tag(tag: char) -> Option<Color> {
        match tag {
            'w' | 'W' => Some(Color::White),
            'b' | 'B' => Some(Color::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// A `(row, col)` board coordinate, 0-indexed
///
/// Row 0 is rank 1 and column 0 is the a-file. A `Square` can hold
/// off-board coordinates (offset arithmetic produces them); use
/// [`Square::new`] or [`Square::is_on_board`] when bounds matter.
///
/// Serializes as algebraic notation (`"e4"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    pub row: i8,
    pub col: i8,
}

impl Square {
    /// Bounds-checked constructor
    pub fn new(row: i8, col: i8) -> Option<Square> {
        let square = Square { row, col };
        square.is_on_board().then_some(square)
    }

    /// Unchecked constructor for compile-time known coordinates
    #[inline]
    pub const fn at(row: i8, col: i8) -> Square {
        Square { row, col }
    }

    #[inline]
    pub fn is_on_board(self) -> bool {
        (0..BOARD_SIZE).contains(&self.row) && (0..BOARD_SIZE).contains(&self.col)
    }

    /// Square shifted by `(d_row, d_col)`, or `None` if it leaves the board
    #[inline]
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Square> {
        Square::new(self.row + d_row, self.col + d_col)
    }

    /// Linear index (0-63) into a row-major cell array
    #[inline]
    pub fn index(self) -> usize {
        (self.row as usize) * (BOARD_SIZE as usize) + self.col as usize
    }

    pub fn from_index(index: usize) -> Option<Square> {
        let size = BOARD_SIZE as usize;
        if index >= size * size {
            return None;
        }
        Square::new((index / size) as i8, (index % size) as i8)
    }

    /// Parse algebraic file-rank notation (`"e4"`)
    ///
    /// Returns `None` for anything that is not exactly a file letter
    /// `a..=h` followed by a rank digit `1..=8`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chess_engine::Square;
    ///
    /// assert_eq!(Square::from_notation("e4"), Some(Square::at(3, 4)));
    /// assert_eq!(Square::from_notation("i9"), None);
    /// ```
    pub fn from_notation(notation: &str) -> Option<Square> {
        let bytes = notation.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0];
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return None;
        }
        Square::new((rank - b'1') as i8, (file - b'a') as i8)
    }

    pub fn notation(self) -> Option<String> {
        if !self.is_on_board() {
            return None;
        }
        let file = (b'a' + self.col as u8) as char;
        let rank = (b'1' + self.row as u8) as char;
        Some(format!("{file}{rank}"))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.notation() {
            Some(notation) => f.write_str(&notation),
            None => write!(f, "({}, {})", self.row, self.col),
        }
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

impl TryFrom<String> for Square {
    type Error = ChessEngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Square::from_notation(&value).ok_or_else(|| ChessEngineError::InvalidSnapshot {
            message: format!("bad square notation {value:?}"),
        })
    }
}

/// A move request: source, destination and optional promotion choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promoting(from: Square, to: Square, promotion: PromotionKind) -> Self {
        Move {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Build a move from two notation strings (`"e2"`, `"e4"`)
    pub fn from_notation(from: &str, to: &str) -> Option<Self> {
        Some(Move::new(
            Square::from_notation(from)?,
            Square::from_notation(to)?,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastleSide {
    Kingside,
    Queenside,
}

/// An applied move as kept in the game history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<PieceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_to: Option<PromotionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub castle: Option<CastleSide>,
}

/// Per-color castling flags
///
/// A flag only ever goes from `true` to `false`: once the king or the
/// matching rook leaves its home square, or the rook's home square is
/// captured on, that side is gone for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingRights {
    pub kingside: bool,
    pub queenside: bool,
}

impl CastlingRights {
    pub const BOTH: CastlingRights = CastlingRights {
        kingside: true,
        queenside: true,
    };
    pub const NONE: CastlingRights = CastlingRights {
        kingside: false,
        queenside: false,
    };

    pub fn allows(self, side: CastleSide) -> bool {
        match side {
            CastleSide::Kingside => self.kingside,
            CastleSide::Queenside => self.queenside,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinReason {
    Checkmate,
    Resignation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawReason {
    Stalemate,
}

/// Lifecycle of a single game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum GameStatus {
    Ongoing,
    Win { winner: Color, reason: WinReason },
    Draw { reason: DrawReason },
}

impl GameStatus {
    pub fn is_ongoing(self) -> bool {
        matches!(self, GameStatus::Ongoing)
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameStatus::Win { winner, .. } => Some(winner),
            _ => None,
        }
    }
}

/// Opaque, URL-safe, unguessable identifier of a match
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Draw a fresh random id
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..MATCH_ID_LEN)
            .map(|_| MATCH_ID_CHARSET[rng.random_range(0..MATCH_ID_CHARSET.len())] as char)
            .collect();
        MatchId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MatchId {
    fn from(value: String) -> Self {
        MatchId(value)
    }
}

impl From<&str> for MatchId {
    fn from(value: &str) -> Self {
        MatchId(value.to_string())
    }
}

/// Stable identity of an authenticated user, supplied by the auth layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Identity(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Identity(value)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Identity(value.to_string())
    }
}
