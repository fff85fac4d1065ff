//! Error types for chess engine
//!
//! Provides custom error types for rules-engine operations including
//! move validation, game lifecycle and snapshot/FEN decoding.

use thiserror::Error;

use crate::types::{Color, Square};

/// Errors that can occur in the chess engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessEngineError {
    /// Identity is neither the white nor the black player
    #[error("{identity} is not a player in this game")]
    NotAPlayer { identity: String },

    /// Player tried to move while it is the opponent's turn
    #[error("It is not {color}'s turn")]
    NotYourTurn { color: Color },

    /// Source square is empty or holds an opponent piece
    #[error("Square {square} does not hold one of your pieces")]
    NotYourPiece { square: Square },

    /// Destination is not in the piece's legal move set
    #[error("Illegal move: from {from} to {to}")]
    IllegalMove { from: Square, to: Square },

    /// Pawn reached the last rank without a promotion choice
    #[error("Move from {from} to {to} requires a promotion piece")]
    PromotionRequired { from: Square, to: Square },

    /// Promotion letter/name could not be parsed
    #[error("Invalid promotion piece: {value}")]
    InvalidPromotion { value: String },

    /// Promotion supplied for a move that does not promote
    #[error("Move from {from} to {to} does not promote")]
    UnexpectedPromotion { from: Square, to: Square },

    /// No piece at the square a move starts from
    #[error("No piece at source square {square}")]
    NoPieceAt { square: Square },

    /// The game already reached a terminal state
    #[error("Game is already over")]
    GameOver,

    /// Host tried to play against itself
    #[error("White and black must be different players")]
    SameIdentity,

    /// A position without exactly one king of the given color
    #[error("Position must contain exactly one {color} king")]
    MissingKing { color: Color },

    /// Malformed FEN string
    #[error("Invalid FEN: {message}")]
    InvalidFen { message: String },

    /// Snapshot failed structural validation
    #[error("Invalid snapshot: {message}")]
    InvalidSnapshot { message: String },
}

/// Result type alias for chess engine operations
pub type ChessEngineResult<T> = Result<T, ChessEngineError>;
