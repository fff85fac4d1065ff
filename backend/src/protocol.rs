//! Wire types shared by the HTTP, SSE and WebSocket handlers

use chess_engine::{
    Color, GamePost, GameSnapshot, Identity, MatchId, Move, PromotionKind, Square,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// `{from, to, promotion?}` as typed by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub promotion: Option<String>,
}

impl MoveRequest {
    /// Parse the notation strings
    ///
    /// Bad squares or promotion letters are [`ApiError::InvalidInput`];
    /// whether the move is legal is the registry's business.
    pub fn to_move(&self) -> Result<Move, ApiError> {
        let from = parse_square(&self.from)?;
        let to = parse_square(&self.to)?;
        let promotion = self
            .promotion
            .as_deref()
            .map(str::parse::<PromotionKind>)
            .transpose()
            .map_err(|err| ApiError::InvalidInput(err.to_string()))?;
        Ok(Move {
            from,
            to,
            promotion,
        })
    }
}

fn parse_square(notation: &str) -> Result<Square, ApiError> {
    Square::from_notation(notation)
        .ok_or_else(|| ApiError::InvalidInput(format!("Invalid square {notation:?}")))
}

/// Result of an accepted move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveOutcome {
    Accepted,
    Checkmate,
    Stalemate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveResponse {
    pub outcome: MoveOutcome,
}

/// How a move ended the match, if it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchEnd {
    Mate,
    Stalemate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEvent {
    /// 1-based position of the move in the game, for ordering on the client
    pub ply: usize,
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_to: Option<PromotionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended: Option<MatchEnd>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResignEvent {
    pub resigned_identity: Identity,
    pub winner: Color,
}

/// Something that happened in a match, pushed to every observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Move(MoveEvent),
    Resign(ResignEvent),
}

impl GameEvent {
    /// Event name on the push channel
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Move(_) => "move",
            GameEvent::Resign(_) => "resign",
        }
    }

    /// JSON payload without the event name
    pub fn payload(&self) -> serde_json::Result<String> {
        match self {
            GameEvent::Move(event) => serde_json::to_string(event),
            GameEvent::Resign(event) => serde_json::to_string(event),
        }
    }

    pub fn is_final(&self) -> bool {
        match self {
            GameEvent::Move(event) => event.ended.is_some(),
            GameEvent::Resign(_) => true,
        }
    }
}

/// Fired once to the host's waiting room when an opponent joins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedEvent {
    pub match_id: MatchId,
    pub white: Identity,
    pub black: Identity,
}

/// Host's color choice when posting: `w`, `b` or `e` (either)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorPreference {
    #[serde(rename = "w", alias = "white")]
    White,
    #[serde(rename = "b", alias = "black")]
    Black,
    #[serde(rename = "e", alias = "either")]
    Either,
}

impl From<ColorPreference> for Option<Color> {
    fn from(preference: ColorPreference) -> Self {
        match preference {
            ColorPreference::White => Some(Color::White),
            ColorPreference::Black => Some(Color::Black),
            ColorPreference::Either => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub color: ColorPreference,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGameResponse {
    pub match_id: MatchId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub match_id: MatchId,
    pub color: Color,
    pub game: GameSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResignResponse {
    pub winner: Color,
}

/// Lobby listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenGame {
    pub match_id: MatchId,
    pub host: Identity,
    pub preferred_color: Option<Color>,
    pub posted_at: DateTime<Utc>,
}

impl From<&GamePost> for OpenGame {
    fn from(post: &GamePost) -> Self {
        OpenGame {
            match_id: post.match_id.clone(),
            host: post.host.clone(),
            preferred_color: post.preferred_color,
            posted_at: post.posted_at,
        }
    }
}

// ---- WebSocket messages ----

/// Server → client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Snapshot { game: GameSnapshot },
    Move(MoveEvent),
    Resign(ResignEvent),
    Error { message: String },
}

impl From<GameEvent> for ServerMessage {
    fn from(event: GameEvent) -> Self {
        match event {
            GameEvent::Move(event) => ServerMessage::Move(event),
            GameEvent::Resign(event) => ServerMessage::Resign(event),
        }
    }
}

/// Client → server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Move(MoveRequest),
    Resign,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_request_parses_notation() {
        let request = MoveRequest {
            from: "b2".into(),
            to: "a1".into(),
            promotion: Some("queen".into()),
        };
        let mv = request.to_move().expect("valid request");
        assert_eq!(mv.from, Square::at(1, 1));
        assert_eq!(mv.to, Square::at(0, 0));
        assert_eq!(mv.promotion, Some(PromotionKind::Queen));
    }

    #[test]
    fn test_move_request_rejects_bad_input() {
        let bad_square = MoveRequest {
            from: "e9".into(),
            to: "e4".into(),
            promotion: None,
        };
        assert!(matches!(bad_square.to_move(), Err(ApiError::InvalidInput(_))));

        let bad_promotion = MoveRequest {
            from: "e7".into(),
            to: "e8".into(),
            promotion: Some("king".into()),
        };
        assert!(matches!(bad_promotion.to_move(), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_move_event_payload_shape() {
        let event = GameEvent::Move(MoveEvent {
            ply: 4,
            from: Square::at(7, 3),
            to: Square::at(3, 7),
            promoted_to: None,
            ended: Some(MatchEnd::Mate),
        });
        assert_eq!(event.name(), "move");
        assert!(event.is_final());
        let payload: serde_json::Value =
            serde_json::from_str(&event.payload().expect("serialize")).expect("json");
        assert_eq!(payload["from"], "d8");
        assert_eq!(payload["to"], "h4");
        assert_eq!(payload["ended"], "mate");
        assert!(payload.get("promotedTo").is_none());
    }

    #[test]
    fn test_client_messages() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"move","from":"e2","to":"e4"}"#).expect("parse");
        assert!(matches!(msg, ClientMessage::Move(ref m) if m.from == "e2"));
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"resign"}"#).expect("parse");
        assert!(matches!(msg, ClientMessage::Resign));
    }

    #[test]
    fn test_color_preference_letters() {
        let request: CreateGameRequest = serde_json::from_str(r#"{"color":"e"}"#).expect("parse");
        assert_eq!(Option::<Color>::from(request.color), None);
        let request: CreateGameRequest = serde_json::from_str(r#"{"color":"b"}"#).expect("parse");
        assert_eq!(Option::<Color>::from(request.color), Some(Color::Black));
        assert!(serde_json::from_str::<CreateGameRequest>(r#"{"color":"x"}"#).is_err());
    }
}
