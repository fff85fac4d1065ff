//! Error types for the live-match service and its HTTP surface
//!
//! [`SessionError`] is what the registry returns; [`ApiError`] is what
//! handlers return and knows its HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chess_engine::{ChessEngineError, Identity, MatchId};
use thiserror::Error;

/// Why the session registry refused an operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No live match under this id (never existed, or already ended)
    #[error("No live match {0}")]
    NoSuchMatch(MatchId),

    /// No pending post under this id; covers losing a join race
    #[error("Match {0} is no longer joinable")]
    NotJoinable(MatchId),

    #[error("You cannot join your own game")]
    CannotJoinOwnGame,

    #[error("{0} already has an open game")]
    AlreadyHosting(Identity),

    #[error("{0} is already playing a game")]
    AlreadyPlaying(Identity),

    #[error("Only the host can do that")]
    NotHost,

    /// The rules engine refused the move or resignation
    #[error(transparent)]
    Rejected(#[from] ChessEngineError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Errors returned by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request content; never reaches the registry
    #[error("{0}")]
    InvalidInput(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Database error")]
    Storage(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Session(err) => match err {
                SessionError::NoSuchMatch(_) | SessionError::NotJoinable(_) => {
                    StatusCode::NOT_FOUND
                }
                SessionError::CannotJoinOwnGame
                | SessionError::AlreadyHosting(_)
                | SessionError::AlreadyPlaying(_) => StatusCode::CONFLICT,
                SessionError::NotHost | SessionError::Rejected(_) => StatusCode::FORBIDDEN,
            },
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.to_string()
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_engine::Square;

    #[test]
    fn test_session_errors_map_to_status_codes() {
        let id = MatchId::from("abc");
        assert_eq!(
            ApiError::from(SessionError::NoSuchMatch(id.clone())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(SessionError::NotJoinable(id)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(SessionError::AlreadyHosting(Identity::new("a"))).status(),
            StatusCode::CONFLICT
        );
        let illegal = ChessEngineError::IllegalMove {
            from: Square::at(1, 4),
            to: Square::at(4, 4),
        };
        assert_eq!(
            ApiError::from(SessionError::from(illegal)).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_invalid_input_is_bad_request() {
        assert_eq!(
            ApiError::InvalidInput("bad square".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
