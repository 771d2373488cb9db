//! Networked multi-table cash-game server built on top of `holdem-engine`.
//! Owns persistence, the per-table actor that serializes mutations, event
//! fan-out, and the HTTP/WebSocket surface clients talk to.

pub mod api;
pub mod broadcaster;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod registry;
pub mod store;
pub mod ws;

pub use api::AppState;
pub use config::TableConfig;
pub use registry::TableRegistry;
pub use store::{InMemoryStore, TableStore};
