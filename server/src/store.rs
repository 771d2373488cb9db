use std::collections::HashMap;
use std::sync::Mutex;

use holdem_engine::{GameActionRecord, GameSnapshot, HandHistory};
use serde::{Deserialize, Serialize};

/// A `PlayerGame` row as indexed by `spec.md` §6.4: unique per (game, seat)
/// and queryable by (game, player).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerGameRecord {
    pub game_id: String,
    pub seat_index: usize,
    pub player_id: String,
}

/// The persisted-entity contract from `spec.md` §6.4, realized as a small
/// trait so the shipped in-memory store is swappable for a real
/// transactional backend without touching `server::coordinator`. No
/// database crate is introduced here: `spec.md` §1 scopes the backend choice
/// out, so adding one would be an unrequested dependency (see DESIGN.md).
pub trait TableStore: Send + Sync {
    fn save_snapshot(&self, game_id: &str, snapshot: GameSnapshot);
    fn load_snapshot(&self, game_id: &str) -> Option<GameSnapshot>;

    fn upsert_player_game(&self, record: PlayerGameRecord);
    fn player_games_for_game(&self, game_id: &str) -> Vec<PlayerGameRecord>;

    fn append_action(&self, game_id: &str, record: GameActionRecord);
    fn actions_for_game(&self, game_id: &str) -> Vec<GameActionRecord>;

    fn append_hand_history(&self, game_id: &str, record: HandHistory);
    /// Newest-first, matching the `GET /games/{id}/hand-history` contract.
    fn hand_history_for_game(&self, game_id: &str) -> Vec<HandHistory>;
}

#[derive(Default)]
struct GameTables {
    snapshot: Option<GameSnapshot>,
    player_games: Vec<PlayerGameRecord>,
    actions: Vec<GameActionRecord>,
    hand_history: Vec<HandHistory>,
}

/// In-process, mutex-guarded reference implementation of [`TableStore`].
#[derive(Default)]
pub struct InMemoryStore {
    games: Mutex<HashMap<String, GameTables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableStore for InMemoryStore {
    fn save_snapshot(&self, game_id: &str, snapshot: GameSnapshot) {
        let mut games = self.games.lock().unwrap();
        games.entry(game_id.to_string()).or_default().snapshot = Some(snapshot);
    }

    fn load_snapshot(&self, game_id: &str) -> Option<GameSnapshot> {
        self.games.lock().unwrap().get(game_id).and_then(|g| g.snapshot.clone())
    }

    fn upsert_player_game(&self, record: PlayerGameRecord) {
        let mut games = self.games.lock().unwrap();
        let entry = games.entry(record.game_id.clone()).or_default();
        if let Some(existing) = entry.player_games.iter_mut().find(|r| r.seat_index == record.seat_index) {
            *existing = record;
        } else {
            entry.player_games.push(record);
        }
    }

    fn player_games_for_game(&self, game_id: &str) -> Vec<PlayerGameRecord> {
        self.games.lock().unwrap().get(game_id).map(|g| g.player_games.clone()).unwrap_or_default()
    }

    fn append_action(&self, game_id: &str, record: GameActionRecord) {
        let mut games = self.games.lock().unwrap();
        games.entry(game_id.to_string()).or_default().actions.push(record);
    }

    fn actions_for_game(&self, game_id: &str) -> Vec<GameActionRecord> {
        self.games.lock().unwrap().get(game_id).map(|g| g.actions.clone()).unwrap_or_default()
    }

    fn append_hand_history(&self, game_id: &str, record: HandHistory) {
        let mut games = self.games.lock().unwrap();
        games.entry(game_id.to_string()).or_default().hand_history.push(record);
    }

    fn hand_history_for_game(&self, game_id: &str) -> Vec<HandHistory> {
        let mut history = self
            .games
            .lock()
            .unwrap()
            .get(game_id)
            .map(|g| g.hand_history.clone())
            .unwrap_or_default();
        history.sort_by(|a, b| b.hand_number.cmp(&a.hand_number));
        history
    }
}
