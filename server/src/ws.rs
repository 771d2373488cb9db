use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::SharedState;
use crate::broadcaster::ServerEvent;

/// `ws/game/{game_id}/`: bearer token passed as a query param since this
/// crate has no real WebSocket subprotocol negotiation layer (`spec.md`
/// §1 scopes authentication out; this is the minimal stand-in for it).
#[derive(Deserialize)]
pub struct SubscribeQuery {
    token: Option<String>,
}

const CLOSE_NORMAL: u16 = 1000;
const CLOSE_AUTH_FAILED: u16 = 4001;
const CLOSE_FORBIDDEN: u16 = 4003;
const CLOSE_NOT_FOUND: u16 = 4004;

pub async fn game_stream(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Query(query): Query<SubscribeQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, game_id, query.token))
}

async fn close_with(socket: &mut WebSocket, code: u16, reason: &'static str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame { code, reason: reason.into() })))
        .await;
}

/// A token with no seat is an anonymous spectator (card-privacy filter still
/// applies); an empty token is treated as authentication failure. This is a
/// placeholder for whatever the identity provider issues; the contract this
/// crate owns is what happens after a token resolves to a player id.
fn resolve_player_id(token: &Option<String>) -> Result<Option<String>, ()> {
    match token {
        None => Ok(None),
        Some(t) if t.is_empty() => Err(()),
        Some(t) => Ok(Some(t.clone())),
    }
}

async fn handle_socket(mut socket: WebSocket, state: SharedState, game_id: String, token: Option<String>) {
    let player_id = match resolve_player_id(&token) {
        Ok(id) => id,
        Err(()) => {
            close_with(&mut socket, CLOSE_AUTH_FAILED, "authentication failed").await;
            return;
        }
    };

    let handle = match state.registry.get(&game_id).await {
        Ok(handle) => handle,
        Err(_) => {
            close_with(&mut socket, CLOSE_NOT_FOUND, "game not found").await;
            return;
        }
    };

    let viewer_seat = match &player_id {
        Some(pid) => {
            let rows = state.registry.player_games(&game_id);
            match rows.into_iter().find(|r| &r.player_id == pid).map(|r| r.seat_index) {
                Some(seat) => Some(seat),
                None => {
                    close_with(&mut socket, CLOSE_FORBIDDEN, "not a member of this game").await;
                    return;
                }
            }
        }
        None => None,
    };

    let (mut subscription, initial_snapshot) = match handle.subscribe(viewer_seat).await {
        Ok(pair) => pair,
        Err(_) => {
            close_with(&mut socket, CLOSE_NOT_FOUND, "game not found").await;
            return;
        }
    };

    if send_event(&mut socket, &ServerEvent::GameUpdate { snapshot: initial_snapshot }).await.is_err() {
        return;
    }

    info!(game_id = %game_id, ?viewer_seat, "websocket subscriber connected");

    loop {
        tokio::select! {
            event = subscription.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(game_id = %game_id, skipped, "subscriber lagged, missed broadcasts");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // this channel is read-only from the client's side
                    Some(Err(_)) => break,
                }
            }
        }
    }

    close_with(&mut socket, CLOSE_NORMAL, "closing").await;
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let text = serde_json::to_string(event).map_err(|_| ())?;
    socket.send(Message::Text(text)).await.map_err(|_| ())
}
