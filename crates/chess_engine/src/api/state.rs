//! Terminal state queries and resignation

use super::Game;
use crate::error::{ChessEngineError, ChessEngineResult};
use crate::types::{Color, GameStatus, Identity, WinReason};

impl Game {
    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        !self.status.is_ongoing()
    }

    /// Has `identity` won, by checkmate or by the opponent resigning?
    pub fn has_won(&self, identity: &Identity) -> bool {
        self.color_of(identity)
            .is_some_and(|color| self.status.winner() == Some(color))
    }

    /// Identity of the winner, if the game ended decisively
    pub fn winner(&self) -> Option<&Identity> {
        self.status.winner().map(|color| self.player(color))
    }

    /// `identity` concedes; returns the winning color
    ///
    /// # Errors
    ///
    /// [`ChessEngineError::GameOver`] if the game already ended,
    /// [`ChessEngineError::NotAPlayer`] for anyone else.
    pub fn resign(&mut self, identity: &Identity) -> ChessEngineResult<Color> {
        if self.is_over() {
            return Err(ChessEngineError::GameOver);
        }
        let color = self
            .color_of(identity)
            .ok_or_else(|| ChessEngineError::NotAPlayer {
                identity: identity.to_string(),
            })?;

        let winner = color.opposite();
        self.status = GameStatus::Win {
            winner,
            reason: WinReason::Resignation,
        };
        Ok(winner)
    }
}
