use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use holdem_engine::error::invalid_action;
use holdem_engine::{Action, GameSnapshot, HandHistory};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::registry::TableRegistry;

pub struct AppState {
    pub registry: TableRegistry,
}

pub type SharedState = Arc<AppState>;

/// Authentication/identity is explicitly out of scope (`spec.md` §1); this
/// reads the caller's player id from a header rather than implementing a
/// real auth scheme. A production deployment swaps this extractor for
/// whatever the identity provider issues without touching the handlers below.
fn caller_player_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-player-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ApiError(invalid_action("missing X-Player-Id header")))
}

async fn seat_for_caller(state: &SharedState, game_id: &str, player_id: &str) -> Result<usize, ApiError> {
    let rows = state.registry.player_games(game_id);
    rows.into_iter()
        .find(|r| r.player_id == player_id)
        .map(|r| r.seat_index)
        .ok_or_else(|| ApiError(invalid_action(format!("{player_id} is not seated at {game_id}"))))
}

#[derive(Deserialize)]
pub struct JoinTableRequest {
    pub buy_in: u64,
}

#[derive(Serialize)]
pub struct JoinTableResponse {
    pub game_id: String,
    pub seat_index: usize,
}

pub async fn join_table(
    State(state): State<SharedState>,
    Path(table_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<JoinTableRequest>,
) -> Result<Json<JoinTableResponse>, ApiError> {
    let player_id = caller_player_id(&headers)?;
    let handle = state
        .registry
        .get_or_create(&table_id, crate::config::TableConfig::default())
        .await?;
    let seat_index = handle.join_table(player_id, body.buy_in).await?;
    Ok(Json(JoinTableResponse { game_id: table_id, seat_index }))
}

pub async fn start_game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let handle = state.registry.get(&game_id).await?;
    handle.start_game().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ActionRequest {
    pub action_type: String,
    pub amount: Option<u64>,
}

fn parse_action(request: ActionRequest) -> Result<Action, ApiError> {
    let amount = request.amount.unwrap_or(0);
    match request.action_type.to_ascii_uppercase().as_str() {
        "FOLD" => Ok(Action::Fold),
        "CHECK" => Ok(Action::Check),
        "CALL" => Ok(Action::Call),
        "BET" => Ok(Action::Bet(amount)),
        "RAISE" => Ok(Action::Raise(amount)),
        "ALL_IN" => Ok(Action::AllIn),
        other => Err(ApiError(invalid_action(format!("unknown action_type {other}")))),
    }
}

pub async fn submit_action(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ActionRequest>,
) -> Result<StatusCode, ApiError> {
    let player_id = caller_player_id(&headers)?;
    let action = parse_action(body)?;
    let handle = state.registry.get(&game_id).await?;
    let seat = seat_for_caller(&state, &game_id, &player_id).await?;
    handle.submit_action(seat, action).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ReadyRequest {
    #[serde(default = "default_ready")]
    pub ready: bool,
}

fn default_ready() -> bool {
    true
}

pub async fn ready_up(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ReadyRequest>,
) -> Result<StatusCode, ApiError> {
    let player_id = caller_player_id(&headers)?;
    let handle = state.registry.get(&game_id).await?;
    let seat = seat_for_caller(&state, &game_id, &player_id).await?;
    handle.ready_up(seat, body.ready).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cash_out(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let player_id = caller_player_id(&headers)?;
    let handle = state.registry.get(&game_id).await?;
    let seat = seat_for_caller(&state, &game_id, &player_id).await?;
    handle.cash_out(seat).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct BuyBackInRequest {
    pub amount: u64,
}

pub async fn buy_back_in(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<BuyBackInRequest>,
) -> Result<StatusCode, ApiError> {
    let player_id = caller_player_id(&headers)?;
    let handle = state.registry.get(&game_id).await?;
    let seat = seat_for_caller(&state, &game_id, &player_id).await?;
    handle.buy_back_in(seat, body.amount).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<u64>, ApiError> {
    let player_id = caller_player_id(&headers)?;
    let handle = state.registry.get(&game_id).await?;
    let seat = seat_for_caller(&state, &game_id, &player_id).await?;
    let bankroll = handle.leave(seat).await?;
    Ok(Json(bankroll))
}

pub async fn get_game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<GameSnapshot>, ApiError> {
    let handle = state.registry.get(&game_id).await?;
    let viewer_seat = match caller_player_id(&headers) {
        Ok(player_id) => seat_for_caller(&state, &game_id, &player_id).await.ok(),
        Err(_) => None,
    };
    let snapshot = handle.snapshot(viewer_seat).await?;
    Ok(Json(snapshot))
}

pub async fn get_hand_history(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<HandHistory>>, ApiError> {
    let player_id = caller_player_id(&headers)?;
    let handle = state.registry.get(&game_id).await?;
    seat_for_caller(&state, &game_id, &player_id).await?;
    let history = handle.hand_history().await?;
    Ok(Json(history))
}
