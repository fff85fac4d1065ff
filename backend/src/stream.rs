//! Push transports: Server-Sent Events and WebSocket
//!
//! Both subscribe a channel to the match's [`ObserverHub`] entry. The
//! [`Subscription`] guard lives inside the stream or socket task, so a
//! client that disconnects is unsubscribed when its task ends.
//!
//! [`ObserverHub`]: crate::observers::ObserverHub
//! [`Subscription`]: crate::observers::Subscription

use std::convert::Infallible;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{HeaderMap, Uri},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use chess_engine::{Identity, MatchId};
use futures::{stream, SinkExt, Stream, StreamExt};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult, SessionError};
use crate::protocol::{ClientMessage, GameEvent, ServerMessage};

fn sse_event(event: &GameEvent) -> Event {
    match event.payload() {
        Ok(payload) => Event::default().event(event.name()).data(payload),
        Err(err) => {
            tracing::error!("Failed to encode {} event: {}", event.name(), err);
            Event::default().comment("encoding error")
        }
    }
}

/// `GET /games/{id}/events`
///
/// Streams `move` and `resign` events until the match ends or the client
/// goes away.
pub async fn game_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let match_id = MatchId::from(id);

    // Subscribe first: a match that ends after this check still closes rx
    let (subscription, rx) = state.sessions.observers().channel(&match_id);
    if !state.sessions.is_live(&match_id) {
        return Err(SessionError::NoSuchMatch(match_id).into());
    }

    let events = stream::unfold((rx, subscription), |(mut rx, subscription)| async move {
        let event = rx.recv().await?;
        Some((Ok::<_, Infallible>(sse_event(&event)), (rx, subscription)))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// `GET /games/{id}/waiting`
///
/// Host only. Emits a single `joined` event when an opponent takes the
/// post, then ends. Ends with no event if the post is cancelled.
pub async fn waiting_room(
    State(state): State<AppState>,
    AuthUser(host): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let match_id = MatchId::from(id);
    let joined = state.sessions.wait_for_opponent(&match_id, &host)?;

    let events = stream::once(joined).filter_map(|joined| async move {
        let joined = joined.ok()?;
        match serde_json::to_string(&joined) {
            Ok(data) => Some(Ok::<_, Infallible>(Event::default().event("joined").data(data))),
            Err(err) => {
                tracing::error!("Failed to encode joined event: {}", err);
                None
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// `GET /games/{id}/ws`
///
/// Anyone may watch; only a token holder who is a player can move or
/// resign over the socket.
pub async fn game_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ApiError> {
    let identity = state.auth.identity_from(&headers, &uri)?;
    let match_id = MatchId::from(id);
    if !state.sessions.is_live(&match_id) {
        return Err(SessionError::NoSuchMatch(match_id).into());
    }

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, match_id, identity))
        .into_response())
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(err) => {
            tracing::error!("Failed to encode socket message: {}", err);
            None
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    match_id: MatchId,
    identity: Option<Identity>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before taking the snapshot so no move falls in between
    let (_subscription, mut events) = state.sessions.observers().channel(&match_id);

    let (opening, live) = match greeting(&state, &match_id) {
        Ok(snapshot) => (snapshot, true),
        Err(gone) => (gone, false),
    };
    if let Some(msg) = encode(&opening) {
        if sender.send(msg).await.is_err() {
            return;
        }
    }
    if !live {
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    // Match closed by the registry
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };
                if let Some(msg) = encode(&ServerMessage::from(event)) {
                    if sender.send(msg).await.is_err() {
                        break;
                    }
                }
            }
            incoming = receiver.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                };
                if let Some(reply) = handle_client_message(&state, &match_id, identity.as_ref(), text.as_str()) {
                    if let Some(msg) = encode(&reply) {
                        if sender.send(msg).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    tracing::debug!("Socket for match {} closed", match_id);
}

/// First message on a socket: the live snapshot, or an error if the match
/// is already over
fn greeting(state: &AppState, match_id: &MatchId) -> Result<ServerMessage, ServerMessage> {
    state
        .sessions
        .live_game(match_id)
        .map(|game| ServerMessage::Snapshot { game })
        .ok_or_else(|| ServerMessage::Error {
            message: format!("No live match {match_id}"),
        })
}

/// Apply a client request; `Some` is an error for this socket only
fn handle_client_message(
    state: &AppState,
    match_id: &MatchId,
    identity: Option<&Identity>,
    text: &str,
) -> Option<ServerMessage> {
    let error = |message: String| Some(ServerMessage::Error { message });

    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => return error(format!("Invalid message: {err}")),
    };
    let Some(identity) = identity else {
        return error(ApiError::Unauthorized.to_string());
    };

    let result = match message {
        ClientMessage::Move(request) => match request.to_move() {
            Ok(mv) => state
                .sessions
                .try_move(match_id, identity, &mv)
                .map(|_| ()),
            Err(err) => return error(err.to_string()),
        },
        ClientMessage::Resign => state.sessions.resign(match_id, identity).map(|_| ()),
    };

    result.err().and_then(|err| error(err.to_string()))
}
