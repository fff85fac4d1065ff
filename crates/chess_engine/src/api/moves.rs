//! Move validation and execution
//!
//! [`Game::check_move`] answers *why* a move is refused; [`Game::can_move`]
//! is the boolean form. [`Game::play`] validates and applies in one step and
//! is what the session layer calls.

use super::Game;
use crate::error::{ChessEngineError, ChessEngineResult};
use crate::pieces::PromotionKind;
use crate::types::{Identity, Move, MoveRecord, Square};

impl Game {
    /// Player, turn, ownership and board legality, without promotion rules
    pub fn can_move(&self, identity: &Identity, from: Square, to: Square) -> bool {
        self.is_player(identity)
            && self.is_turn(identity)
            && self.owns(identity, from)
            && self.board.can_move(from, to)
    }

    pub fn forced_promotions(&self, from: Square, to: Square) -> &'static [PromotionKind] {
        self.board.forced_promotion_choices(from, to)
    }

    /// Validate `mv` for `identity` without touching the board
    ///
    /// # Errors
    ///
    /// - [`ChessEngineError::GameOver`] once the game reached a terminal state
    /// - [`ChessEngineError::NotAPlayer`], [`ChessEngineError::NotYourTurn`],
    ///   [`ChessEngineError::NotYourPiece`] for the identity checks
    /// - [`ChessEngineError::IllegalMove`] if the destination is not legal
    /// - [`ChessEngineError::PromotionRequired`] /
    ///   [`ChessEngineError::UnexpectedPromotion`] for promotion mismatches
    pub fn check_move(&self, identity: &Identity, mv: &Move) -> ChessEngineResult<()> {
        if !self.status.is_ongoing() {
            return Err(ChessEngineError::GameOver);
        }

        let color = self
            .color_of(identity)
            .ok_or_else(|| ChessEngineError::NotAPlayer {
                identity: identity.to_string(),
            })?;

        if color != self.board.turn() {
            return Err(ChessEngineError::NotYourTurn { color });
        }

        if !self.board.occupied_by(mv.from, color) {
            return Err(ChessEngineError::NotYourPiece { square: mv.from });
        }

        if !self.board.can_move(mv.from, mv.to) {
            return Err(ChessEngineError::IllegalMove {
                from: mv.from,
                to: mv.to,
            });
        }

        let choices = self.forced_promotions(mv.from, mv.to);
        match mv.promotion {
            None if !choices.is_empty() => Err(ChessEngineError::PromotionRequired {
                from: mv.from,
                to: mv.to,
            }),
            Some(_) if choices.is_empty() => Err(ChessEngineError::UnexpectedPromotion {
                from: mv.from,
                to: mv.to,
            }),
            Some(kind) if !choices.contains(&kind) => Err(ChessEngineError::InvalidPromotion {
                value: kind.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Apply an already validated move and refresh the status
    ///
    /// Does not re-check legality; see [`Game::check_move`].
    pub fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PromotionKind>,
    ) -> ChessEngineResult<MoveRecord> {
        let record = self.board.apply_move(from, to, promotion)?;
        self.history.push(record.clone());
        self.status = self.board.status();
        Ok(record)
    }

    /// Validate and apply `mv` on behalf of `identity`
    ///
    /// On error the game is left exactly as it was.
    ///
    /// # Examples
    ///
    /// ```
    /// use chess_engine::{Game, Identity, MatchId, Move};
    ///
    /// let mut game = Game::new(MatchId::from("m1"), Identity::new("w"), Identity::new("b")).unwrap();
    /// let e2e4 = Move::from_notation("e2", "e4").unwrap();
    ///
    /// assert!(game.play(&Identity::new("b"), &e2e4).is_err());
    /// assert!(game.play(&Identity::new("w"), &e2e4).is_ok());
    /// ```
    pub fn play(&mut self, identity: &Identity, mv: &Move) -> ChessEngineResult<MoveRecord> {
        self.check_move(identity, mv)?;
        self.apply_move(mv.from, mv.to, mv.promotion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::pieces::{Piece, PieceKind};
    use crate::types::{Color, MatchId};

    fn sq(notation: &str) -> Square {
        Square::from_notation(notation).expect("valid square")
    }

    fn game_from(fen: &str) -> Game {
        let board = Board::from_fen(fen).expect("valid FEN");
        Game::with_board(
            MatchId::from("test"),
            Identity::new("white"),
            Identity::new("black"),
            board,
        )
        .expect("Should create game")
    }

    #[test]
    fn test_check_move_reports_each_refusal() {
        let game = game_from(crate::constants::STANDARD_FEN);
        let white = Identity::new("white");
        let black = Identity::new("black");

        let e2e4 = Move::new(sq("e2"), sq("e4"));
        assert!(matches!(
            game.check_move(&Identity::new("eve"), &e2e4),
            Err(ChessEngineError::NotAPlayer { .. })
        ));
        assert_eq!(
            game.check_move(&black, &Move::new(sq("e7"), sq("e5"))),
            Err(ChessEngineError::NotYourTurn {
                color: Color::Black
            })
        );
        assert_eq!(
            game.check_move(&white, &Move::new(sq("e7"), sq("e5"))),
            Err(ChessEngineError::NotYourPiece { square: sq("e7") })
        );
        assert_eq!(
            game.check_move(&white, &Move::new(sq("e2"), sq("e5"))),
            Err(ChessEngineError::IllegalMove {
                from: sq("e2"),
                to: sq("e5")
            })
        );
        assert_eq!(
            game.check_move(&white, &Move::promoting(sq("e2"), sq("e4"), PromotionKind::Queen)),
            Err(ChessEngineError::UnexpectedPromotion {
                from: sq("e2"),
                to: sq("e4")
            })
        );
        assert_eq!(game.check_move(&white, &e2e4), Ok(()));
    }

    #[test]
    fn test_rejected_move_leaves_game_untouched() {
        let mut game = game_from(crate::constants::STANDARD_FEN);
        let before = game.clone();
        let result = game.play(&Identity::new("white"), &Move::new(sq("d1"), sq("d4")));
        assert!(result.is_err());
        assert_eq!(game, before);
    }

    #[test]
    fn test_promotion_required_then_accepted() {
        let mut game = game_from("4k3/8/8/8/8/8/p7/1N2K3 b -");
        let black = Identity::new("black");
        let capture = Move::new(sq("a2"), sq("b1"));

        assert_eq!(
            game.play(&black, &capture),
            Err(ChessEngineError::PromotionRequired {
                from: sq("a2"),
                to: sq("b1")
            })
        );

        let record = game
            .play(&black, &Move::promoting(sq("a2"), sq("b1"), PromotionKind::Queen))
            .expect("Should promote");
        assert_eq!(record.captured, Some(PieceKind::Knight));
        assert_eq!(record.promoted_to, Some(PromotionKind::Queen));
        assert_eq!(game.board().piece_at(sq("b1")), Some(Piece::Queen(Color::Black)));
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_pawn_loses_double_step_after_moving() {
        let mut game = game_from(crate::constants::STANDARD_FEN);
        let white = Identity::new("white");
        let black = Identity::new("black");

        game.play(&white, &Move::new(sq("a2"), sq("a3"))).expect("a3");
        game.play(&black, &Move::new(sq("h7"), sq("h6"))).expect("h6");
        assert!(!game.can_move(&white, sq("a3"), sq("a5")));
        assert!(game.can_move(&white, sq("a3"), sq("a4")));
    }
}
