//! Live-match registry
//!
//! Holds the pending lobby (posted games waiting for an opponent) and the
//! live matches. It is the only path through which a [`Game`] is mutated.
//!
//! ## Locking
//!
//! - `lobby`: one mutex; `join` removes the post while holding it, so at most
//!   one joiner can ever win a post.
//! - `live`: a read-write map of `Arc<LiveMatch>`. Lookups clone the `Arc`
//!   and drop the map lock straight away.
//! - each [`LiveMatch`] has its own mutex around the game. Moves and
//!   resignations on one match are serialized; other matches never wait.
//!
//! Order is always lobby → live, or match → live. Observers are notified
//! after every lock is released.

use std::collections::HashMap;
use std::sync::Arc;

use chess_engine::{
    Color, Game, GamePost, GameSnapshot, GameStatus, Identity, MatchId, Move, MoveRecord,
};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;

use crate::error::{SessionError, SessionResult};
use crate::observers::ObserverHub;
use crate::persistence::{MatchRecord, ResultQueue};
use crate::protocol::{
    GameEvent, JoinedEvent, MatchEnd, MoveEvent, MoveOutcome, OpenGame, ResignEvent,
};

struct PendingPost {
    post: GamePost,
    /// Single-slot observer for the host's waiting room
    waiting: Option<oneshot::Sender<JoinedEvent>>,
}

/// A match in progress
pub struct LiveMatch {
    pub white: Identity,
    pub black: Identity,
    game: Mutex<Game>,
}

impl LiveMatch {
    fn involves(&self, identity: &Identity) -> bool {
        self.white == *identity || self.black == *identity
    }
}

/// What a successful move produced
#[derive(Debug, Clone)]
pub struct MoveReport {
    pub outcome: MoveOutcome,
    pub record: MoveRecord,
    pub event: GameEvent,
}

pub struct GameSessions {
    lobby: Mutex<HashMap<MatchId, PendingPost>>,
    live: RwLock<HashMap<MatchId, Arc<LiveMatch>>>,
    observers: Arc<ObserverHub>,
    results: ResultQueue,
}

impl GameSessions {
    pub fn new(results: ResultQueue) -> Self {
        GameSessions {
            lobby: Mutex::new(HashMap::new()),
            live: RwLock::new(HashMap::new()),
            observers: ObserverHub::new(),
            results,
        }
    }

    pub fn observers(&self) -> &Arc<ObserverHub> {
        &self.observers
    }

    fn is_playing(&self, identity: &Identity) -> bool {
        self.live.read().values().any(|live| live.involves(identity))
    }

    fn live_match(&self, match_id: &MatchId) -> SessionResult<Arc<LiveMatch>> {
        self.live
            .read()
            .get(match_id)
            .cloned()
            .ok_or_else(|| SessionError::NoSuchMatch(match_id.clone()))
    }

    /// Post a game; the host may have one open post and no live game
    pub fn create_game(
        &self,
        host: Identity,
        preferred_color: Option<Color>,
    ) -> SessionResult<MatchId> {
        let mut lobby = self.lobby.lock();

        if lobby.values().any(|pending| pending.post.host == host) {
            return Err(SessionError::AlreadyHosting(host));
        }
        if self.is_playing(&host) {
            return Err(SessionError::AlreadyPlaying(host));
        }

        let post = GamePost::new(host, preferred_color);
        let match_id = post.match_id.clone();
        tracing::info!("{} posted match {}", post.host, match_id);
        lobby.insert(
            match_id.clone(),
            PendingPost {
                post,
                waiting: None,
            },
        );
        Ok(match_id)
    }

    /// Withdraw an open post; only its host may
    pub fn cancel(&self, match_id: &MatchId, identity: &Identity) -> SessionResult<()> {
        let mut lobby = self.lobby.lock();
        let pending = lobby
            .get(match_id)
            .ok_or_else(|| SessionError::NotJoinable(match_id.clone()))?;
        if pending.post.host != *identity {
            return Err(SessionError::NotHost);
        }
        lobby.remove(match_id);
        tracing::info!("{} cancelled match {}", identity, match_id);
        Ok(())
    }

    /// Open posts, oldest first
    pub fn open_games(&self) -> Vec<OpenGame> {
        let mut games: Vec<OpenGame> = self
            .lobby
            .lock()
            .values()
            .map(|pending| OpenGame::from(&pending.post))
            .collect();
        games.sort_by_key(|game| game.posted_at);
        games
    }

    /// Register the host's waiting room for `match_id`
    ///
    /// The receiver fires once when an opponent joins, or errors if the
    /// post is cancelled. A second call replaces the first observer.
    pub fn wait_for_opponent(
        &self,
        match_id: &MatchId,
        identity: &Identity,
    ) -> SessionResult<oneshot::Receiver<JoinedEvent>> {
        let mut lobby = self.lobby.lock();
        let pending = lobby
            .get_mut(match_id)
            .ok_or_else(|| SessionError::NotJoinable(match_id.clone()))?;
        if pending.post.host != *identity {
            return Err(SessionError::NotHost);
        }
        let (tx, rx) = oneshot::channel();
        pending.waiting = Some(tx);
        Ok(rx)
    }

    /// Accept an open post
    ///
    /// A joiner already in a live game is refused. Any post the joiner had
    /// open is withdrawn.
    ///
    /// Removing the post from the lobby is the atomic step: a second joiner
    /// racing for the same post finds nothing and gets
    /// [`SessionError::NotJoinable`].
    pub fn join(&self, match_id: &MatchId, joiner: Identity) -> SessionResult<(Color, GameSnapshot)> {
        let (game, waiting) = {
            let mut lobby = self.lobby.lock();
            let pending = lobby
                .get(match_id)
                .ok_or_else(|| SessionError::NotJoinable(match_id.clone()))?;
            if pending.post.host == joiner {
                return Err(SessionError::CannotJoinOwnGame);
            }
            if self.is_playing(&joiner) {
                return Err(SessionError::AlreadyPlaying(joiner));
            }
            let pending = lobby
                .remove(match_id)
                .ok_or_else(|| SessionError::NotJoinable(match_id.clone()))?;

            let game = pending.post.accept(joiner.clone())?;

            // Joining withdraws the joiner's own post; its waiting room closes
            lobby.retain(|_, own| own.post.host != joiner);

            self.live.write().insert(
                match_id.clone(),
                Arc::new(LiveMatch {
                    white: game.white().clone(),
                    black: game.black().clone(),
                    game: Mutex::new(game.clone()),
                }),
            );
            (game, pending.waiting)
        };

        tracing::info!(
            "Match {} started: {} (white) vs {} (black)",
            match_id,
            game.white(),
            game.black()
        );

        if let Some(waiting) = waiting {
            let joined = JoinedEvent {
                match_id: match_id.clone(),
                white: game.white().clone(),
                black: game.black().clone(),
            };
            if waiting.send(joined).is_err() {
                tracing::debug!("Host left the waiting room of match {}", match_id);
            }
        }

        let color = game.color_of(&joiner).unwrap_or(Color::White);
        Ok((color, game.snapshot()))
    }

    /// Validate and apply a move
    ///
    /// On success every observer receives a `move` event. A move that ends
    /// the game removes the match and queues its result.
    pub fn try_move(
        &self,
        match_id: &MatchId,
        identity: &Identity,
        mv: &Move,
    ) -> SessionResult<MoveReport> {
        let live = self.live_match(match_id)?;

        let (record, ply, status, recipients, finished) = {
            let mut game = live.game.lock();
            let record = game.play(identity, mv).inspect_err(|err| {
                tracing::warn!("Rejected move in match {} by {}: {}", match_id, identity, err);
            })?;
            let status = game.status();
            let recipients = self.observers.recipients(match_id);
            let finished = self.finish_if_over(&game);
            (record, game.history().len(), status, recipients, finished)
        };

        tracing::debug!(
            "Match {}: {} played {}{}",
            match_id,
            identity,
            record.from,
            record.to
        );

        let (outcome, ended) = match status {
            GameStatus::Ongoing => (MoveOutcome::Accepted, None),
            GameStatus::Win { .. } => (MoveOutcome::Checkmate, Some(MatchEnd::Mate)),
            GameStatus::Draw { .. } => (MoveOutcome::Stalemate, Some(MatchEnd::Stalemate)),
        };

        let event = GameEvent::Move(MoveEvent {
            ply,
            from: record.from,
            to: record.to,
            promoted_to: record.promoted_to,
            ended,
        });
        self.observers.deliver(recipients, &event);

        if let Some(result) = finished {
            self.close(result);
        }

        Ok(MoveReport {
            outcome,
            record,
            event,
        })
    }

    /// `identity` resigns; returns the winning color
    ///
    /// Outsiders are refused and the match stays live.
    pub fn resign(&self, match_id: &MatchId, identity: &Identity) -> SessionResult<Color> {
        let live = self.live_match(match_id)?;

        let (winner, recipients, finished) = {
            let mut game = live.game.lock();
            let winner = game.resign(identity).inspect_err(|err| {
                tracing::warn!("Rejected resignation in match {} by {}: {}", match_id, identity, err);
            })?;
            let recipients = self.observers.recipients(match_id);
            (winner, recipients, self.finish_if_over(&game))
        };

        tracing::info!("{} resigned match {}", identity, match_id);

        let event = GameEvent::Resign(ResignEvent {
            resigned_identity: identity.clone(),
            winner,
        });
        self.observers.deliver(recipients, &event);

        if let Some(result) = finished {
            self.close(result);
        }

        Ok(winner)
    }

    /// Convenience form of [`GameSessions::resign`]
    pub fn try_resign(&self, match_id: &MatchId, identity: &Identity) -> bool {
        self.resign(match_id, identity).is_ok()
    }

    /// Snapshot of a live match, for spectators and reconnects
    pub fn live_game(&self, match_id: &MatchId) -> Option<GameSnapshot> {
        let live = self.live_match(match_id).ok()?;
        let snapshot = live.game.lock().snapshot();
        Some(snapshot)
    }

    pub fn is_live(&self, match_id: &MatchId) -> bool {
        self.live.read().contains_key(match_id)
    }

    pub fn live_count(&self) -> usize {
        self.live.read().len()
    }

    /// Remove a finished game from the live map, still under its match lock
    fn finish_if_over(&self, game: &Game) -> Option<MatchRecord> {
        let record = MatchRecord::from_game(game, Utc::now())?;
        self.live.write().remove(game.match_id());
        Some(record)
    }

    fn close(&self, record: MatchRecord) {
        tracing::info!(
            "Match {} ended: {} by {}",
            record.match_id,
            record.result_tag(),
            record.reason_tag()
        );
        self.observers.close(&record.match_id);
        self.results.submit(record);
    }
}
