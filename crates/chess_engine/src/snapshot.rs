//! Serializable views of boards and games
//!
//! Sent to spectators and reconnecting clients. A snapshot converts back into
//! a [`Board`]/[`Game`] with identical placement, turn and castling rights.
//! The pawn "moved" flag is not stored: a pawn still on its starting row can
//! never have moved, so it is recovered from the square.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::Game;
use crate::board::{Board, Cells};
use crate::constants::BOARD_SIZE;
use crate::error::{ChessEngineError, ChessEngineResult};
use crate::pieces::{Piece, PieceKind};
use crate::types::{CastlingRights, Color, GameStatus, Identity, MatchId, MoveRecord, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub kind: PieceKind,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingSnapshot {
    pub white: CastlingRights,
    pub black: CastlingRights,
}

/// 64 cells in row-major order starting at a1, then b1 … h8
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub cells: Vec<Option<CellSnapshot>>,
    pub turn: Color,
    pub castling: CastlingSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub match_id: MatchId,
    pub white: Identity,
    pub black: Identity,
    pub board: BoardSnapshot,
    pub history: Vec<MoveRecord>,
    pub started_at: DateTime<Utc>,
    pub status: GameStatus,
}

impl From<&Board> for BoardSnapshot {
    fn from(board: &Board) -> Self {
        let cells = board
            .cells()
            .iter()
            .flatten()
            .map(|cell| {
                cell.map(|piece| CellSnapshot {
                    kind: piece.kind(),
                    color: piece.color(),
                })
            })
            .collect();

        BoardSnapshot {
            cells,
            turn: board.turn(),
            castling: CastlingSnapshot {
                white: board.castling_rights(Color::White),
                black: board.castling_rights(Color::Black),
            },
        }
    }
}

impl TryFrom<BoardSnapshot> for Board {
    type Error = ChessEngineError;

    fn try_from(snapshot: BoardSnapshot) -> ChessEngineResult<Board> {
        let size = BOARD_SIZE as usize;
        if snapshot.cells.len() != size * size {
            return Err(ChessEngineError::InvalidSnapshot {
                message: format!("expected 64 cells, found {}", snapshot.cells.len()),
            });
        }

        let mut cells: Cells = [[None; BOARD_SIZE as usize]; BOARD_SIZE as usize];
        for (index, cell) in snapshot.cells.into_iter().enumerate() {
            let Some(CellSnapshot { kind, color }) = cell else {
                continue;
            };
            let square = Square::from_index(index).ok_or_else(|| {
                ChessEngineError::InvalidSnapshot {
                    message: format!("cell index {index} out of range"),
                }
            })?;
            let mut piece = Piece::new(kind, color);
            if kind == PieceKind::Pawn && square.row != color.pawn_row() {
                piece.mark_moved();
            }
            cells[square.row as usize][square.col as usize] = Some(piece);
        }

        Board::from_parts(
            cells,
            snapshot.turn,
            [snapshot.castling.white, snapshot.castling.black],
        )
    }
}

impl Game {
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::from(self)
    }

    pub fn from_snapshot(snapshot: GameSnapshot) -> ChessEngineResult<Game> {
        Game::try_from(snapshot)
    }
}

impl From<&Game> for GameSnapshot {
    fn from(game: &Game) -> Self {
        GameSnapshot {
            match_id: game.match_id.clone(),
            white: game.white.clone(),
            black: game.black.clone(),
            board: BoardSnapshot::from(&game.board),
            history: game.history.clone(),
            started_at: game.started_at,
            status: game.status,
        }
    }
}

impl TryFrom<GameSnapshot> for Game {
    type Error = ChessEngineError;

    fn try_from(snapshot: GameSnapshot) -> ChessEngineResult<Game> {
        if snapshot.white == snapshot.black {
            return Err(ChessEngineError::SameIdentity);
        }
        let board = Board::try_from(snapshot.board)?;
        Ok(Game {
            match_id: snapshot.match_id,
            white: snapshot.white,
            black: snapshot.black,
            board,
            history: snapshot.history,
            started_at: snapshot.started_at,
            status: snapshot.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_snapshot_shape() {
        let snapshot = BoardSnapshot::from(&Board::standard());
        assert_eq!(snapshot.cells.len(), 64);
        assert_eq!(
            snapshot.cells[4],
            Some(CellSnapshot {
                kind: PieceKind::King,
                color: Color::White
            })
        );
        assert_eq!(snapshot.cells[28], None, "e4 is empty");

        let json = serde_json::to_value(&snapshot).expect("Should serialize");
        assert_eq!(json["cells"][0]["kind"], "r");
        assert_eq!(json["cells"][0]["color"], "white");
        assert_eq!(json["turn"], "white");
        assert_eq!(json["castling"]["black"]["queenside"], true);
    }

    #[test]
    fn test_snapshot_rejects_wrong_cell_count() {
        let mut snapshot = BoardSnapshot::from(&Board::standard());
        snapshot.cells.pop();
        assert!(matches!(
            Board::try_from(snapshot),
            Err(ChessEngineError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn test_snapshot_without_king_is_rejected() {
        let mut snapshot = BoardSnapshot::from(&Board::standard());
        snapshot.cells[60] = None;
        assert_eq!(
            Board::try_from(snapshot),
            Err(ChessEngineError::MissingKing {
                color: Color::Black
            })
        );
    }
}
