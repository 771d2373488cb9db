use std::collections::HashSet;

use holdem_engine::{ErrorKind, GameSnapshot, Phase};
use serde::Serialize;
use tokio::sync::broadcast;

/// Wire envelope matching `spec.md` §6.2: `{type, data}` with
/// `type ∈ {game_update, game_summary_notification}`. `ActionRejected` is an
/// ambient addition so a WebSocket subscriber sees why its own last action
/// was refused without polling `GET /games/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    GameUpdate { snapshot: GameSnapshot },
    GameSummaryNotification { snapshot: GameSnapshot },
    ActionRejected { kind: ErrorKind, message: String },
}

/// Per-table fan-out (`spec.md` §4.6 / C6). Backed by `tokio::sync::broadcast`
/// rather than the teacher's `Vec<ClientTx>` of unbounded channels: a slow
/// subscriber drops messages instead of applying backpressure to the whole
/// table, while every subscriber that keeps up still sees events in order.
pub struct Broadcaster {
    sender: broadcast::Sender<ServerEvent>,
    summary_sent: bool,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, summary_sent: false }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn publish_update(&self, snapshot: &GameSnapshot) {
        let _ = self.sender.send(ServerEvent::GameUpdate { snapshot: snapshot.clone() });
    }

    /// Broadcasts the terminal summary event exactly once per table, tracked
    /// by `summary_sent` (`spec.md` §4.7's "Summary is broadcast exactly once").
    pub fn publish_summary_once(&mut self, snapshot: &GameSnapshot) {
        if self.summary_sent {
            return;
        }
        self.summary_sent = true;
        let _ = self.sender.send(ServerEvent::GameSummaryNotification { snapshot: snapshot.clone() });
    }

    pub fn publish_rejection(&self, kind: ErrorKind, message: String) {
        let _ = self.sender.send(ServerEvent::ActionRejected { kind, message });
    }
}

/// Applies the card-privacy filter from `spec.md` §6.1: a seat's hole cards
/// are visible to the viewer that owns it, to everyone once the hand reaches
/// SHOWDOWN, or to everyone if that seat was revealed at the last showdown;
/// otherwise they are cleared.
pub fn project_for_viewer(snapshot: &GameSnapshot, viewer_seat: Option<usize>) -> GameSnapshot {
    let mut projected = snapshot.clone();
    let shown_seats: HashSet<usize> = projected
        .winner_info
        .as_ref()
        .map(|w| w.shown_hole_cards.iter().map(|(seat, _)| *seat).collect())
        .unwrap_or_default();
    let at_showdown = projected.phase == Phase::Showdown;
    for seat in &mut projected.seats {
        let visible = viewer_seat == Some(seat.seat_index) || at_showdown || shown_seats.contains(&seat.seat_index);
        if !visible {
            seat.hole_cards.clear();
        }
    }
    projected
}
