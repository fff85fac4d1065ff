//! Game lifecycle management
//!
//! Posting a game, accepting a post and answering identity questions.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::board::Board;
use crate::error::{ChessEngineError, ChessEngineResult};
use crate::types::{Color, GameStatus, Identity, MatchId, MoveRecord, Square};

/// A game waiting for an opponent
///
/// The match id is assigned up front so the eventual [`Game`] keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePost {
    pub match_id: MatchId,
    pub host: Identity,
    /// `None` means the host has no preference
    pub preferred_color: Option<Color>,
    pub posted_at: DateTime<Utc>,
}

impl GamePost {
    pub fn new(host: Identity, preferred_color: Option<Color>) -> Self {
        GamePost {
            match_id: MatchId::generate(),
            host,
            preferred_color,
            posted_at: Utc::now(),
        }
    }

    /// Turn the post into a game against `joiner`
    ///
    /// Honors the host's color preference, otherwise flips a coin.
    pub fn accept(self, joiner: Identity) -> ChessEngineResult<Game> {
        self.accept_with(joiner, &mut rand::rng())
    }

    pub fn accept_with<R: Rng>(
        self,
        joiner: Identity,
        rng: &mut R,
    ) -> ChessEngineResult<Game> {
        let host_color = self
            .preferred_color
            .unwrap_or_else(|| if rng.random_bool(0.5) { Color::White } else { Color::Black });

        let (white, black) = match host_color {
            Color::White => (self.host, joiner),
            Color::Black => (joiner, self.host),
        };

        Game::new(self.match_id, white, black)
    }
}

/// One match between two distinct identities
///
/// The board is owned exclusively; every change goes through
/// [`Game::play`], [`Game::apply_move`] or [`Game::resign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub(crate) match_id: MatchId,
    pub(crate) white: Identity,
    pub(crate) black: Identity,
    pub(crate) board: Board,
    pub(crate) history: Vec<MoveRecord>,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) status: GameStatus,
}

impl Game {
    /// Start a game from the standard position
    pub fn new(match_id: MatchId, white: Identity, black: Identity) -> ChessEngineResult<Game> {
        Game::with_board(match_id, white, black, Board::standard())
    }

    /// Start a game from an arbitrary position
    pub fn with_board(
        match_id: MatchId,
        white: Identity,
        black: Identity,
        board: Board,
    ) -> ChessEngineResult<Game> {
        if white == black {
            return Err(ChessEngineError::SameIdentity);
        }
        let status = board.status();
        Ok(Game {
            match_id,
            white,
            black,
            board,
            history: Vec::new(),
            started_at: Utc::now(),
            status,
        })
    }

    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    pub fn white(&self) -> &Identity {
        &self.white
    }

    pub fn black(&self) -> &Identity {
        &self.black
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn turn(&self) -> Color {
        self.board.turn()
    }

    /// Identity playing `color`
    pub fn player(&self, color: Color) -> &Identity {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn is_player(&self, identity: &Identity) -> bool {
        self.color_of(identity).is_some()
    }

    /// `None` for anyone who is not one of the two players
    pub fn color_of(&self, identity: &Identity) -> Option<Color> {
        if *identity == self.white {
            Some(Color::White)
        } else if *identity == self.black {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn is_turn(&self, identity: &Identity) -> bool {
        self.color_of(identity) == Some(self.board.turn())
    }

    /// Does `from` hold a piece of `identity`'s color?
    pub fn owns(&self, identity: &Identity, from: Square) -> bool {
        self.color_of(identity)
            .is_some_and(|color| self.board.occupied_by(from, color))
    }
}
