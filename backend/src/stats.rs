//! Read-only views over stored results

use axum::extract::{Json, Path, State};
use chess_engine::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::persistence::ordered_pair;

/// How many finished games `/users/{name}/games` returns
pub const RECENT_GAMES_LIMIT: i64 = 50;

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub wins: i64,
    pub losses: i64,
    pub draws: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameSummary {
    pub match_id: String,
    pub white: String,
    pub black: String,
    pub result: String,
    pub reason: String,
    pub moves: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Record between two users; `a_wins` belongs to `a` as requested
#[derive(Debug, Serialize, Deserialize)]
pub struct HeadToHead {
    pub a: String,
    pub b: String,
    pub a_wins: i64,
    pub b_wins: i64,
    pub draws: i64,
}

pub async fn user_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let row = sqlx::query(
        "SELECT username, wins, losses, draws, created_at FROM users WHERE username = $1",
    )
    .bind(&name)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("No user {name}")))?;

    Ok(Json(UserProfile {
        username: row.try_get("username")?,
        wins: row.try_get("wins")?,
        losses: row.try_get("losses")?,
        draws: row.try_get("draws")?,
        created_at: row.try_get("created_at")?,
    }))
}

/// Finished games involving `name`, newest first
pub async fn user_games(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<GameSummary>>> {
    let rows = sqlx::query(
        "SELECT match_id, white, black, result, reason, moves, started_at, ended_at
         FROM games
         WHERE white = $1 OR black = $1
         ORDER BY ended_at DESC
         LIMIT $2",
    )
    .bind(&name)
    .bind(RECENT_GAMES_LIMIT)
    .fetch_all(&state.db)
    .await?;

    let games = rows
        .iter()
        .map(|row| {
            Ok(GameSummary {
                match_id: row.try_get("match_id")?,
                white: row.try_get("white")?,
                black: row.try_get("black")?,
                result: row.try_get("result")?,
                reason: row.try_get("reason")?,
                moves: row.try_get("moves")?,
                started_at: row.try_get("started_at")?,
                ended_at: row.try_get("ended_at")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(Json(games))
}

pub async fn head_to_head(
    State(state): State<AppState>,
    Path((name, other)): Path<(String, String)>,
) -> ApiResult<Json<HeadToHead>> {
    let a = Identity::new(name);
    let b = Identity::new(other);
    if a == b {
        return Err(ApiError::InvalidInput(
            "Head-to-head needs two different users".into(),
        ));
    }

    let (first, second) = ordered_pair(&a, &b);
    let row = sqlx::query(
        "SELECT a_wins, b_wins, draws FROM head_to_head WHERE user_a = $1 AND user_b = $2",
    )
    .bind(first.as_str())
    .bind(second.as_str())
    .fetch_optional(&state.db)
    .await?;

    let (first_wins, second_wins, draws) = match row {
        Some(row) => (
            row.try_get::<i64, _>("a_wins")?,
            row.try_get::<i64, _>("b_wins")?,
            row.try_get::<i64, _>("draws")?,
        ),
        None => (0, 0, 0),
    };

    // Stored order may be the reverse of the request
    let (a_wins, b_wins) = if first == &a {
        (first_wins, second_wins)
    } else {
        (second_wins, first_wins)
    };

    Ok(Json(HeadToHead {
        a: a.to_string(),
        b: b.to_string(),
        a_wins,
        b_wins,
        draws,
    }))
}
