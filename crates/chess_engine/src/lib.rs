//! Chess rules engine for two-player live games
//!
//! Synchronous and free of I/O. The layers, leaves first:
//! - [`types`] - squares, moves, colors, status and identifiers
//! - [`pieces`] - the closed [`Piece`] variant
//! - [`move_gen`] - per-kind control areas and legal moves
//! - [`board`] - the 8×8 [`Board`] with castling, promotion and check logic
//! - [`api`] - [`Game`] and [`GamePost`], who may move what
//! - [`snapshot`] - JSON views that convert back into boards and games
//!
//! ```
//! use chess_engine::{Game, GameStatus, Identity, MatchId, Move};
//!
//! let white = Identity::new("white");
//! let black = Identity::new("black");
//! let mut game = Game::new(MatchId::generate(), white.clone(), black.clone()).unwrap();
//!
//! for (who, from, to) in [(&white, "f2", "f3"), (&black, "e7", "e5"), (&white, "g2", "g4"), (&black, "d8", "h4")] {
//!     game.play(who, &Move::from_notation(from, to).unwrap()).unwrap();
//! }
//! assert!(matches!(game.status(), GameStatus::Win { .. }));
//! ```

pub mod api;
pub mod board;
pub mod constants;
pub mod error;
pub mod move_gen;
pub mod pieces;
pub mod snapshot;
pub mod types;

pub use api::{Game, GamePost};
pub use board::Board;
pub use error::{ChessEngineError, ChessEngineResult};
pub use pieces::{Piece, PieceKind, PromotionKind};
pub use snapshot::{BoardSnapshot, CastlingSnapshot, CellSnapshot, GameSnapshot};
pub use types::{
    CastleSide, CastlingRights, Color, DrawReason, GameStatus, Identity, MatchId, Move,
    MoveRecord, Square, WinReason,
};
