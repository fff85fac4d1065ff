use crate::auth::{self, AuthKeys, AuthUser};
use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::persistence::{ResultWriter, SqliteResultStore};
use crate::protocol::{
    CreateGameRequest, CreateGameResponse, JoinResponse, MoveRequest, MoveResponse, OpenGame,
    ResignResponse,
};
use crate::session::GameSessions;
use crate::{stats, stream};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chess_engine::{GameSnapshot, MatchId};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Database Pool
    pub db: Pool<Sqlite>,
    pub sessions: Arc<GameSessions>,
    pub auth: Arc<AuthKeys>,
}

impl AppState {
    /// Build the shared state and start the result writer
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(db: Pool<Sqlite>, config: &ServerConfig) -> Self {
        let store = Arc::new(SqliteResultStore::new(db.clone()));
        let (results, _writer) = ResultWriter::spawn(store, config.persist_retries);

        AppState {
            db,
            sessions: Arc::new(GameSessions::new(results)),
            auth: Arc::new(AuthKeys::new(&config.jwt_secret, config.token_ttl)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/games", post(create_game))
        .route("/games/open", get(open_games))
        .route("/games/{id}", get(live_game).delete(cancel_game))
        .route("/games/{id}/join", post(join_game))
        .route("/games/{id}/move", post(make_move))
        .route("/games/{id}/resign", post(resign))
        .route("/games/{id}/events", get(stream::game_events))
        .route("/games/{id}/waiting", get(stream::waiting_room))
        .route("/games/{id}/ws", get(stream::game_socket))
        .route("/users/{name}", get(stats::user_profile))
        .route("/users/{name}/games", get(stats::user_games))
        .route("/users/{name}/versus/{other}", get(stats::head_to_head))
        .with_state(state)
}

async fn open_games(State(state): State<AppState>) -> Json<Vec<OpenGame>> {
    Json(state.sessions.open_games())
}

async fn create_game(
    State(state): State<AppState>,
    AuthUser(host): AuthUser,
    Json(payload): Json<CreateGameRequest>,
) -> ApiResult<(StatusCode, Json<CreateGameResponse>)> {
    let match_id = state.sessions.create_game(host, payload.color.into())?;
    Ok((StatusCode::CREATED, Json(CreateGameResponse { match_id })))
}

async fn cancel_game(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.sessions.cancel(&MatchId::from(id), &identity)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn join_game(
    State(state): State<AppState>,
    AuthUser(joiner): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<JoinResponse>> {
    let match_id = MatchId::from(id);
    let (color, game) = state.sessions.join(&match_id, joiner)?;
    Ok(Json(JoinResponse {
        match_id,
        color,
        game,
    }))
}

async fn live_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<GameSnapshot>> {
    state
        .sessions
        .live_game(&MatchId::from(id.as_str()))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No live match {id}")))
}

async fn make_move(
    State(state): State<AppState>,
    AuthUser(player): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<MoveRequest>,
) -> ApiResult<Json<MoveResponse>> {
    let mv = payload.to_move()?;
    let report = state
        .sessions
        .try_move(&MatchId::from(id), &player, &mv)?;
    Ok(Json(MoveResponse {
        outcome: report.outcome,
    }))
}

async fn resign(
    State(state): State<AppState>,
    AuthUser(player): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ResignResponse>> {
    let winner = state.sessions.resign(&MatchId::from(id), &player)?;
    Ok(Json(ResignResponse { winner }))
}
