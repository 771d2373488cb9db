use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use holdem_server::api::{self, AppState};
use holdem_server::ws;
use holdem_server::{InMemoryStore, TableRegistry};
use tower_http::services::ServeDir;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let store = Arc::new(InMemoryStore::new());
    let state: api::SharedState = Arc::new(AppState { registry: TableRegistry::new(store) });

    let app = Router::new()
        .route("/tables/:table_id/join_table", post(api::join_table))
        .route("/games/:game_id/start", post(api::start_game))
        .route("/games/:game_id/action", post(api::submit_action))
        .route("/games/:game_id/ready", post(api::ready_up))
        .route("/games/:game_id/cash_out", post(api::cash_out))
        .route("/games/:game_id/buy_back_in", post(api::buy_back_in))
        .route("/games/:game_id/leave", post(api::leave))
        .route("/games/:game_id", get(api::get_game))
        .route("/games/:game_id/hand-history", get(api::get_hand_history))
        .route("/ws/game/:game_id/", get(ws::game_stream))
        .nest_service("/", ServeDir::new("public"))
        .with_state(state);

    let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
    info!(%addr, "starting holdem-server");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
