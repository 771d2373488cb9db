use std::time::Duration;

use holdem_engine::error::invalid_action;
use holdem_engine::{EngineResult, TableConfig as EngineTableConfig};
use serde::{Deserialize, Serialize};

/// The server's view of table configuration, generalizing the teacher's
/// `RoomConfig`. Converts into `holdem_engine::TableConfig` plus the
/// transport-level knobs (timers, queue depth) the engine itself doesn't
/// need to know about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    pub max_seats: usize,
    pub small_blind: u64,
    pub big_blind: u64,
    pub min_buy_in: u64,
    pub max_buy_in: u64,
    /// `None` disables the per-turn timer and lets a hand stall indefinitely
    /// (documented policy, `spec.md` §5's "document the chosen policy").
    pub action_timeout_ms: Option<u64>,
    /// How long the coordinator waits for every seat to ready up between
    /// hands before starting anyway (`spec.md` §4.7).
    pub ready_timeout_ms: u64,
    /// Bounded command queue depth before a table rejects with `TABLE_BUSY`.
    pub command_queue_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "table".into(),
            max_seats: 6,
            small_blind: 5,
            big_blind: 10,
            min_buy_in: 100,
            max_buy_in: 1000,
            action_timeout_ms: Some(20_000),
            ready_timeout_ms: 10_000,
            command_queue_capacity: 256,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> EngineResult<()> {
        self.to_engine_config().validate()?;
        if self.command_queue_capacity == 0 {
            return Err(invalid_action("command_queue_capacity must be > 0"));
        }
        Ok(())
    }

    pub fn to_engine_config(&self) -> EngineTableConfig {
        EngineTableConfig {
            name: self.name.clone(),
            max_seats: self.max_seats,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            min_buy_in: self.min_buy_in,
            max_buy_in: self.max_buy_in,
        }
    }

    pub fn action_timeout(&self) -> Option<Duration> {
        self.action_timeout_ms.map(Duration::from_millis)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}
