//! Durable record of finished matches
//!
//! The registry never waits on the database. Finished matches go onto an
//! unbounded queue; a [`ResultWriter`] task drains it into a [`ResultSink`],
//! retrying failed writes a bounded number of times. Delivery is
//! at-least-once, so sinks must ignore a match id they already stored.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chess_engine::{Color, DrawReason, Game, GameStatus, Identity, MatchId, WinReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// How a match ended, in terms of identities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Win {
        winner: Identity,
        loser: Identity,
        reason: WinReason,
    },
    Draw {
        reason: DrawReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub white: Identity,
    pub black: Identity,
    pub outcome: Outcome,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub moves: usize,
}

impl MatchRecord {
    /// `None` while the game is still running
    pub fn from_game(game: &Game, ended_at: DateTime<Utc>) -> Option<MatchRecord> {
        let outcome = match game.status() {
            GameStatus::Ongoing => return None,
            GameStatus::Win { winner, reason } => Outcome::Win {
                winner: game.player(winner).clone(),
                loser: game.player(winner.opposite()).clone(),
                reason,
            },
            GameStatus::Draw { reason } => Outcome::Draw { reason },
        };

        Some(MatchRecord {
            match_id: game.match_id().clone(),
            white: game.white().clone(),
            black: game.black().clone(),
            outcome,
            started_at: game.started_at(),
            ended_at,
            moves: game.history().len(),
        })
    }

    /// `"white"`, `"black"` or `"draw"`
    pub fn result_tag(&self) -> &'static str {
        match &self.outcome {
            Outcome::Win { winner, .. } if *winner == self.white => "white",
            Outcome::Win { .. } => "black",
            Outcome::Draw { .. } => "draw",
        }
    }

    pub fn reason_tag(&self) -> &'static str {
        match &self.outcome {
            Outcome::Win {
                reason: WinReason::Checkmate,
                ..
            } => "checkmate",
            Outcome::Win {
                reason: WinReason::Resignation,
                ..
            } => "resignation",
            Outcome::Draw {
                reason: DrawReason::Stalemate,
            } => "stalemate",
        }
    }

    pub fn winner_color(&self) -> Option<Color> {
        match &self.outcome {
            Outcome::Win { winner, .. } if *winner == self.white => Some(Color::White),
            Outcome::Win { .. } => Some(Color::Black),
            Outcome::Draw { .. } => None,
        }
    }
}

/// Somewhere finished matches are stored
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Store `record`; `Ok(false)` when this match id was already stored
    async fn record(&self, record: &MatchRecord) -> Result<bool, sqlx::Error>;
}

/// Create the tables used by accounts, results and statistics
pub async fn init_schema(db: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            wins INTEGER NOT NULL DEFAULT 0,
            losses INTEGER NOT NULL DEFAULT 0,
            draws INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );",
    )
    .execute(db)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS games (
            match_id TEXT PRIMARY KEY,
            white TEXT NOT NULL,
            black TEXT NOT NULL,
            result TEXT NOT NULL,
            reason TEXT NOT NULL,
            moves INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            ended_at TEXT NOT NULL
        );",
    )
    .execute(db)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS head_to_head (
            user_a TEXT NOT NULL,
            user_b TEXT NOT NULL,
            a_wins INTEGER NOT NULL DEFAULT 0,
            b_wins INTEGER NOT NULL DEFAULT 0,
            draws INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_a, user_b)
        );",
    )
    .execute(db)
    .await?;

    Ok(())
}

/// [`ResultSink`] over the SQLite tables from [`init_schema`]
#[derive(Clone)]
pub struct SqliteResultStore {
    db: Pool<Sqlite>,
}

impl SqliteResultStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        SqliteResultStore { db }
    }
}

#[async_trait]
impl ResultSink for SqliteResultStore {
    async fn record(&self, record: &MatchRecord) -> Result<bool, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO games
                (match_id, white, black, result, reason, moves, started_at, ended_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.match_id.as_str())
        .bind(record.white.as_str())
        .bind(record.black.as_str())
        .bind(record.result_tag())
        .bind(record.reason_tag())
        .bind(record.moves as i64)
        .bind(record.started_at)
        .bind(record.ended_at)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if !inserted {
            tx.rollback().await?;
            return Ok(false);
        }

        match &record.outcome {
            Outcome::Win { winner, loser, .. } => {
                sqlx::query("UPDATE users SET wins = wins + 1 WHERE username = $1")
                    .bind(winner.as_str())
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("UPDATE users SET losses = losses + 1 WHERE username = $1")
                    .bind(loser.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
            Outcome::Draw { .. } => {
                sqlx::query("UPDATE users SET draws = draws + 1 WHERE username IN ($1, $2)")
                    .bind(record.white.as_str())
                    .bind(record.black.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        // Unordered pair, stored with user_a < user_b
        let (a, b) = ordered_pair(&record.white, &record.black);
        let (a_wins, b_wins, draws) = match &record.outcome {
            Outcome::Win { winner, .. } if winner == a => (1, 0, 0),
            Outcome::Win { .. } => (0, 1, 0),
            Outcome::Draw { .. } => (0, 0, 1),
        };
        sqlx::query(
            "INSERT INTO head_to_head (user_a, user_b, a_wins, b_wins, draws)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_a, user_b) DO UPDATE SET
                a_wins = a_wins + excluded.a_wins,
                b_wins = b_wins + excluded.b_wins,
                draws = draws + excluded.draws",
        )
        .bind(a.as_str())
        .bind(b.as_str())
        .bind(a_wins)
        .bind(b_wins)
        .bind(draws)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

pub fn ordered_pair<'a>(x: &'a Identity, y: &'a Identity) -> (&'a Identity, &'a Identity) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

/// Sending half of the result queue, held by the registry
#[derive(Clone)]
pub struct ResultQueue {
    tx: mpsc::UnboundedSender<MatchRecord>,
}

impl ResultQueue {
    /// Enqueue without waiting; a stopped writer only costs a log line
    pub fn submit(&self, record: MatchRecord) {
        let match_id = record.match_id.clone();
        if self.tx.send(record).is_err() {
            tracing::error!("Result writer stopped, dropping record for match {}", match_id);
        }
    }
}

/// Background task draining the [`ResultQueue`] into a [`ResultSink`]
pub struct ResultWriter {
    sink: Arc<dyn ResultSink>,
    attempts: u32,
    rx: mpsc::UnboundedReceiver<MatchRecord>,
}

impl ResultWriter {
    /// Spawn the writer; it stops once every [`ResultQueue`] clone is dropped
    pub fn spawn(sink: Arc<dyn ResultSink>, attempts: u32) -> (ResultQueue, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = ResultWriter {
            sink,
            attempts: attempts.max(1),
            rx,
        };
        let handle = tokio::spawn(writer.run());
        (ResultQueue { tx }, handle)
    }

    async fn run(mut self) {
        while let Some(record) = self.rx.recv().await {
            self.store(&record).await;
        }
        tracing::debug!("Result writer finished");
    }

    async fn store(&self, record: &MatchRecord) {
        for attempt in 1..=self.attempts {
            match self.sink.record(record).await {
                Ok(true) => {
                    tracing::info!(
                        "Stored match {} ({} by {})",
                        record.match_id,
                        record.result_tag(),
                        record.reason_tag()
                    );
                    return;
                }
                Ok(false) => {
                    tracing::debug!("Match {} was already stored", record.match_id);
                    return;
                }
                Err(err) if attempt < self.attempts => {
                    tracing::warn!(
                        "Storing match {} failed (attempt {}/{}): {}",
                        record.match_id,
                        attempt,
                        self.attempts,
                        err
                    );
                    tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
                }
                Err(err) => {
                    tracing::error!(
                        "Giving up on match {} after {} attempts: {}",
                        record.match_id,
                        self.attempts,
                        err
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_engine::Move;
    use parking_lot::Mutex;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::Row;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn finished_game() -> Game {
        let white = Identity::new("alice");
        let black = Identity::new("bob");
        let mut game =
            Game::new(MatchId::from("fools"), white.clone(), black.clone()).expect("game");
        for (who, from, to) in [
            (&white, "f2", "f3"),
            (&black, "e7", "e5"),
            (&white, "g2", "g4"),
            (&black, "d8", "h4"),
        ] {
            game.play(who, &Move::from_notation(from, to).expect("squares"))
                .expect("legal");
        }
        game
    }

    async fn test_db() -> Pool<Sqlite> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create test database");
        init_schema(&db).await.expect("schema");
        db
    }

    async fn add_user(db: &Pool<Sqlite>, name: &str) {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES ($1, $2, 'x', $3)",
        )
        .bind(name)
        .bind(name)
        .bind(Utc::now())
        .execute(db)
        .await
        .expect("insert user");
    }

    #[test]
    fn test_record_from_checkmate() {
        let record = MatchRecord::from_game(&finished_game(), Utc::now()).expect("finished");
        assert_eq!(
            record.outcome,
            Outcome::Win {
                winner: Identity::new("bob"),
                loser: Identity::new("alice"),
                reason: WinReason::Checkmate
            }
        );
        assert_eq!(record.result_tag(), "black");
        assert_eq!(record.reason_tag(), "checkmate");
        assert_eq!(record.moves, 4);
    }

    #[test]
    fn test_no_record_for_running_game() {
        let game = Game::new(MatchId::from("m"), Identity::new("a"), Identity::new("b"))
            .expect("game");
        assert!(MatchRecord::from_game(&game, Utc::now()).is_none());
    }

    #[tokio::test]
    async fn test_sqlite_store_updates_counters_once() {
        let db = test_db().await;
        add_user(&db, "alice").await;
        add_user(&db, "bob").await;
        let store = SqliteResultStore::new(db.clone());
        let record = MatchRecord::from_game(&finished_game(), Utc::now()).expect("finished");

        assert!(store.record(&record).await.expect("first write"));
        assert!(!store.record(&record).await.expect("duplicate write"));

        let bob = sqlx::query("SELECT wins, losses FROM users WHERE username = 'bob'")
            .fetch_one(&db)
            .await
            .expect("bob");
        assert_eq!(bob.get::<i64, _>("wins"), 1);
        assert_eq!(bob.get::<i64, _>("losses"), 0);

        let h2h = sqlx::query("SELECT user_a, a_wins, b_wins FROM head_to_head")
            .fetch_one(&db)
            .await
            .expect("head to head");
        assert_eq!(h2h.get::<String, _>("user_a"), "alice");
        assert_eq!(h2h.get::<i64, _>("a_wins"), 0);
        assert_eq!(h2h.get::<i64, _>("b_wins"), 1);
    }

    #[tokio::test]
    async fn test_sqlite_store_counts_draws_for_both_players() {
        let db = test_db().await;
        add_user(&db, "alice").await;
        add_user(&db, "bob").await;
        let store = SqliteResultStore::new(db.clone());

        let draw = |id: &str| MatchRecord {
            match_id: MatchId::from(id),
            white: Identity::new("bob"),
            black: Identity::new("alice"),
            outcome: Outcome::Draw {
                reason: DrawReason::Stalemate,
            },
            started_at: Utc::now(),
            ended_at: Utc::now(),
            moves: 19,
        };
        assert!(store.record(&draw("d1")).await.expect("first draw"));
        assert!(store.record(&draw("d2")).await.expect("second draw"));
        assert!(!store.record(&draw("d1")).await.expect("duplicate"));

        for name in ["alice", "bob"] {
            let row = sqlx::query("SELECT wins, losses, draws FROM users WHERE username = $1")
                .bind(name)
                .fetch_one(&db)
                .await
                .expect("user");
            assert_eq!(row.get::<i64, _>("draws"), 2, "{name}");
            assert_eq!(row.get::<i64, _>("wins"), 0);
            assert_eq!(row.get::<i64, _>("losses"), 0);
        }

        let h2h = sqlx::query("SELECT user_a, user_b, a_wins, b_wins, draws FROM head_to_head")
            .fetch_all(&db)
            .await
            .expect("head to head");
        assert_eq!(h2h.len(), 1);
        assert_eq!(h2h[0].get::<String, _>("user_a"), "alice");
        assert_eq!(h2h[0].get::<String, _>("user_b"), "bob");
        assert_eq!(h2h[0].get::<i64, _>("draws"), 2);
        assert_eq!(h2h[0].get::<i64, _>("a_wins"), 0);
        assert_eq!(h2h[0].get::<i64, _>("b_wins"), 0);

        let reason: String = sqlx::query("SELECT result, reason FROM games WHERE match_id = 'd1'")
            .fetch_one(&db)
            .await
            .expect("game row")
            .get("reason");
        assert_eq!(reason, "stalemate");
    }

    struct Flaky {
        failures_left: AtomicU32,
        stored: Mutex<Vec<MatchId>>,
    }

    #[async_trait]
    impl ResultSink for Flaky {
        async fn record(&self, record: &MatchRecord) -> Result<bool, sqlx::Error> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(sqlx::Error::PoolTimedOut);
            }
            self.stored.lock().push(record.match_id.clone());
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_writer_retries_then_stores() {
        let sink = Arc::new(Flaky {
            failures_left: AtomicU32::new(2),
            stored: Mutex::new(Vec::new()),
        });
        let (queue, handle) = ResultWriter::spawn(sink.clone(), 3);
        queue.submit(MatchRecord::from_game(&finished_game(), Utc::now()).expect("finished"));
        drop(queue);
        handle.await.expect("writer task");

        assert_eq!(*sink.stored.lock(), vec![MatchId::from("fools")]);
    }

    #[tokio::test]
    async fn test_writer_gives_up_after_attempts() {
        let sink = Arc::new(Flaky {
            failures_left: AtomicU32::new(5),
            stored: Mutex::new(Vec::new()),
        });
        let (queue, handle) = ResultWriter::spawn(sink.clone(), 2);
        queue.submit(MatchRecord::from_game(&finished_game(), Utc::now()).expect("finished"));
        drop(queue);
        handle.await.expect("writer task");

        assert!(sink.stored.lock().is_empty());
        assert_eq!(sink.failures_left.load(Ordering::SeqCst), 3);
    }
}
