//! Game API handlers.
//!
//! All routes require a valid access token and act on the caller's most
//! recently created session.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tictactoe::{
    Board, GameError, GameSession, GameState, Symbol,
    auth::GameStats,
    game::{Outcome, SessionId},
};

use super::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthenticatedUser,
    request_id::RequestId,
};
use crate::metrics::{self, GameOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGamePayload {
    #[serde(default)]
    pub is_computer_first: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct MovePayload {
    #[serde(default)]
    pub row: Option<i64>,
    #[serde(default)]
    pub col: Option<i64>,
}

/// Session as returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionView {
    pub id: SessionId,
    pub board: Board,
    pub current_player: Symbol,
    pub game_state: GameState,
    pub is_computer_first: bool,
}

impl From<GameSession> for GameSessionView {
    fn from(session: GameSession) -> Self {
        Self {
            id: session.id,
            board: session.board,
            current_player: session.current_player,
            game_state: session.game_state,
            is_computer_first: session.is_computer_first,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub game_session: GameSessionView,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: GameStats,
}

/// Record oracle failures before handing the error to the HTTP layer
fn game_error(err: GameError) -> ApiError {
    match &err {
        GameError::Oracle(oracle) => metrics::oracle_errors_total(oracle.kind()),
        GameError::NoMoveAvailable => metrics::oracle_errors_total("no_move"),
        _ => {}
    }
    err.into()
}

/// Count a session that just finished, from the human's point of view
fn record_outcome(session: &GameSession) {
    let outcome = match session.game_state.tally() {
        Some(Outcome::Draw) => GameOutcome::Draw,
        Some(Outcome::Winner(winner)) if winner == session.human_symbol() => GameOutcome::Win,
        Some(Outcome::Winner(_)) => GameOutcome::Loss,
        Some(Outcome::Undecided) | None => return,
    };
    metrics::game_outcomes_total(outcome);
}

/// Start a new game.
///
/// # Request Body
///
/// ```json
/// { "isComputerFirst": false }
/// ```
///
/// When the computer goes first it plays X and its opening move is already on
/// the returned board.
///
/// # Errors
///
/// - `400 Bad Request`: `isComputerFirst` missing or not a boolean
/// - `500 Internal Server Error`: The move oracle failed on the opening move
pub async fn start_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    request_id: RequestId,
    payload: Result<Json<StartGamePayload>, JsonRejection>,
) -> ApiResult<Json<GameSessionResponse>> {
    let Json(payload) = payload?;
    let is_computer_first = payload
        .is_computer_first
        .ok_or_else(|| ApiError::Validation("isComputerFirst is required".to_string()))?;

    let session = state
        .game_manager
        .create_session(user.id, is_computer_first)
        .await
        .map_err(game_error)?;

    metrics::games_started_total(is_computer_first);
    tracing::info!(
        request_id = request_id.as_str(),
        user_id = user.id,
        session_id = session.id,
        is_computer_first,
        "Game started"
    );

    Ok(Json(GameSessionResponse {
        message: Some("Game started successfully".to_string()),
        game_session: session.into(),
    }))
}

/// Get the caller's in-progress game.
///
/// # Errors
///
/// - `404 Not Found`: No session, or the most recent one is over
pub async fn current_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<GameSessionResponse>> {
    let session = state
        .game_manager
        .active_session(user.id)
        .await
        .map_err(game_error)?
        .ok_or_else(|| ApiError::NotFound("No active game session found".to_string()))?;

    Ok(Json(GameSessionResponse {
        message: None,
        game_session: session.into(),
    }))
}

/// Play a move in the caller's in-progress game.
///
/// # Request Body
///
/// ```json
/// { "row": 0, "col": 2 }
/// ```
///
/// Unless the move ends the game, the response already contains the
/// computer's reply.
///
/// # Errors
///
/// - `400 Bad Request`: Missing coordinates, off-board position, occupied cell
/// - `404 Not Found`: No in-progress session
/// - `500 Internal Server Error`: The move oracle failed; the player's move is
///   kept and the client should re-fetch `/game/current`
pub async fn make_move(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    request_id: RequestId,
    payload: Result<Json<MovePayload>, JsonRejection>,
) -> ApiResult<Json<GameSessionResponse>> {
    let Json(payload) = payload?;
    let (Some(row), Some(col)) = (payload.row, payload.col) else {
        return Err(ApiError::Validation("row and col are required".to_string()));
    };

    let current = state
        .game_manager
        .active_session(user.id)
        .await
        .map_err(game_error)?
        .ok_or_else(|| {
            ApiError::NotFound("No active game session found. Please start a new game.".to_string())
        })?;

    let session = state
        .game_manager
        .apply_player_move(current.id, user.id, row, col)
        .await
        .map_err(game_error)?;

    if session.is_over() {
        record_outcome(&session);
        tracing::info!(
            request_id = request_id.as_str(),
            user_id = user.id,
            session_id = session.id,
            winner = ?session.game_state.winner,
            "Game finished"
        );
    }

    Ok(Json(GameSessionResponse {
        message: Some("Move made successfully".to_string()),
        game_session: session.into(),
    }))
}

/// Get the caller's win/loss/draw counters.
///
/// # Response
///
/// ```json
/// { "stats": { "wins": 1, "losses": 0, "draws": 2 } }
/// ```
pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<StatsResponse>> {
    let stats = state
        .game_manager
        .user_stats(user.id)
        .await
        .map_err(game_error)?;

    Ok(Json(StatsResponse { stats }))
}
