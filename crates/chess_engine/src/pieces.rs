//! Piece model
//!
//! [`Piece`] is a closed tagged variant, one arm per kind. Move generation
//! dispatches on it with a single `match` per operation (see
//! [`crate::move_gen`]). Only pawns carry mutable state: whether they have
//! moved, which gates the double step. King and rook history lives on the
//! board as castling rights.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChessEngineError;
use crate::types::Color;

/// Kind tag of a piece, serialized as its one-character letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "p")]
    Pawn,
    #[serde(rename = "n")]
    Knight,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "k")]
    King,
}

impl PieceKind {
    pub fn tag(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// Case-insensitive inverse of [`PieceKind::tag`]
    pub fn from_tag(tag: char) -> Option<PieceKind> {
        match tag.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

/// Pieces a pawn may promote to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionKind {
    #[serde(rename = "n")]
    Knight,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "q")]
    Queen,
}

impl PromotionKind {
    pub const ALL: [PromotionKind; 4] = [
        PromotionKind::Knight,
        PromotionKind::Bishop,
        PromotionKind::Rook,
        PromotionKind::Queen,
    ];
}

impl From<PromotionKind> for PieceKind {
    fn from(kind: PromotionKind) -> Self {
        match kind {
            PromotionKind::Knight => PieceKind::Knight,
            PromotionKind::Bishop => PieceKind::Bishop,
            PromotionKind::Rook => PieceKind::Rook,
            PromotionKind::Queen => PieceKind::Queen,
        }
    }
}

impl FromStr for PromotionKind {
    type Err = ChessEngineError;

    /// Accepts the one-letter tag or the full piece name
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "n" | "knight" => Ok(PromotionKind::Knight),
            "b" | "bishop" => Ok(PromotionKind::Bishop),
            "r" | "rook" => Ok(PromotionKind::Rook),
            "q" | "queen" => Ok(PromotionKind::Queen),
            _ => Err(ChessEngineError::InvalidPromotion {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for PromotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", PieceKind::from(*self).tag())
    }
}

/// A chess piece owned by exactly one board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Piece {
    Pawn { color: Color, moved: bool },
    Knight(Color),
    Bishop(Color),
    Rook(Color),
    Queen(Color),
    King(Color),
}

impl Piece {
    /// Freshly constructed piece; pawns start unmoved
    pub fn new(kind: PieceKind, color: Color) -> Self {
        match kind {
            PieceKind::Pawn => Piece::Pawn {
                color,
                moved: false,
            },
            PieceKind::Knight => Piece::Knight(color),
            PieceKind::Bishop => Piece::Bishop(color),
            PieceKind::Rook => Piece::Rook(color),
            PieceKind::Queen => Piece::Queen(color),
            PieceKind::King => Piece::King(color),
        }
    }

    pub fn color(self) -> Color {
        match self {
            Piece::Pawn { color, .. } => color,
            Piece::Knight(color)
            | Piece::Bishop(color)
            | Piece::Rook(color)
            | Piece::Queen(color)
            | Piece::King(color) => color,
        }
    }

    pub fn kind(self) -> PieceKind {
        match self {
            Piece::Pawn { .. } => PieceKind::Pawn,
            Piece::Knight(_) => PieceKind::Knight,
            Piece::Bishop(_) => PieceKind::Bishop,
            Piece::Rook(_) => PieceKind::Rook,
            Piece::Queen(_) => PieceKind::Queen,
            Piece::King(_) => PieceKind::King,
        }
    }

    #[inline]
    pub fn is_kind(self, kind: PieceKind) -> bool {
        self.kind() == kind
    }

    /// FEN letter: uppercase for White, lowercase for Black
    pub fn fen_char(self) -> char {
        let tag = self.kind().tag();
        match self.color() {
            Color::White => tag.to_ascii_uppercase(),
            Color::Black => tag,
        }
    }

    /// Record that the piece has left its square. Only pawns care.
    pub fn mark_moved(&mut self) {
        if let Piece::Pawn { moved, .. } = self {
            *moved = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion_parses_tags_and_names() {
        assert_eq!("q".parse::<PromotionKind>(), Ok(PromotionKind::Queen));
        assert_eq!("Knight".parse::<PromotionKind>(), Ok(PromotionKind::Knight));
        assert!("k".parse::<PromotionKind>().is_err());
        assert!("pawn".parse::<PromotionKind>().is_err());
    }

    #[test]
    fn test_mark_moved_only_touches_pawns() {
        let mut pawn = Piece::new(PieceKind::Pawn, Color::White);
        pawn.mark_moved();
        assert_eq!(
            pawn,
            Piece::Pawn {
                color: Color::White,
                moved: true
            }
        );

        let mut rook = Piece::new(PieceKind::Rook, Color::Black);
        rook.mark_moved();
        assert_eq!(rook, Piece::Rook(Color::Black));
    }

    #[test]
    fn test_fen_char_case_follows_color() {
        assert_eq!(Piece::King(Color::White).fen_char(), 'K');
        assert_eq!(Piece::new(PieceKind::Knight, Color::Black).fen_char(), 'n');
    }
}
