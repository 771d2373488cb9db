use std::collections::HashMap;
use std::sync::Arc;

use holdem_engine::error::game_not_found;
use holdem_engine::EngineResult;
use tokio::sync::Mutex;

use crate::config::TableConfig;
use crate::coordinator::{self, TableHandle};
use crate::store::{PlayerGameRecord, TableStore};

/// Maps table ids to their running game actor. Table creation/listing CRUD
/// is out of scope (`spec.md` §1): a table's actor is spawned lazily, the
/// first time `join_table` names an id this process hasn't seen, using that
/// request's config. One game per table for this engine's lifetime, matching
/// §3's "Table is referenced by Games but does not own them" — we never spin
/// up a second concurrent game for the same table id.
pub struct TableRegistry {
    store: Arc<dyn TableStore>,
    tables: Mutex<HashMap<String, TableHandle>>,
}

impl TableRegistry {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store, tables: Mutex::new(HashMap::new()) }
    }

    pub async fn get_or_create(&self, table_id: &str, config: TableConfig) -> EngineResult<TableHandle> {
        let mut tables = self.tables.lock().await;
        if let Some(handle) = tables.get(table_id) {
            return Ok(handle.clone());
        }
        let handle = coordinator::spawn(table_id.to_string(), config, self.store.clone())?;
        tables.insert(table_id.to_string(), handle.clone());
        Ok(handle)
    }

    pub fn player_games(&self, game_id: &str) -> Vec<PlayerGameRecord> {
        self.store.player_games_for_game(game_id)
    }

    pub async fn get(&self, game_id: &str) -> EngineResult<TableHandle> {
        self.tables
            .lock()
            .await
            .get(game_id)
            .cloned()
            .ok_or_else(|| game_not_found(format!("no game {game_id}")))
    }
}
