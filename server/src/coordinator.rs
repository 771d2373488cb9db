use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use holdem_engine::error::table_busy;
use holdem_engine::{Action, ActionOutcome, EngineResult, Game, GameSnapshot, HandHistory, Phase, Status};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::broadcaster::{project_for_viewer, Broadcaster, ServerEvent};
use crate::config::TableConfig;
use crate::store::{PlayerGameRecord, TableStore};

/// Every request shape a table can receive, generalizing the teacher's
/// `ActorMsg`/`ClientAction` split into one enum that covers `spec.md` §6.1's
/// REST surface plus the lifecycle operations (`ready`, `cash_out`,
/// `buy_back_in`, `leave`) and a subscribe request for C6.
pub enum Command {
    Subscribe { viewer_seat: Option<usize> },
    JoinTable { player_id: String, buy_in: u64 },
    StartGame,
    SubmitAction { seat: usize, action: Action },
    ReadyUp { seat: usize, ready: bool },
    CashOut { seat: usize },
    BuyBackIn { seat: usize, amount: u64 },
    Leave { seat: usize },
    Snapshot { viewer_seat: Option<usize> },
    HandHistory,
}

pub enum CommandReply {
    Unit,
    SeatIndex(usize),
    Bankroll(u64),
    Snapshot(GameSnapshot),
    History(Vec<HandHistory>),
    Subscription(broadcast::Receiver<ServerEvent>, GameSnapshot),
}

struct Envelope {
    command: Command,
    reply: oneshot::Sender<EngineResult<CommandReply>>,
}

/// Cloneable front door to a table actor. Dropping every handle closes the
/// command channel, which ends the actor's `run` loop.
#[derive(Clone)]
pub struct TableHandle {
    table_id: String,
    tx: mpsc::Sender<Envelope>,
}

impl TableHandle {
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    async fn send(&self, command: Command) -> EngineResult<CommandReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .try_send(Envelope { command, reply: reply_tx })
            .map_err(|_| table_busy(format!("table {} command queue is full", self.table_id)))?;
        reply_rx.await.map_err(|_| table_busy("table actor shut down before replying"))?
    }

    pub async fn subscribe(&self, viewer_seat: Option<usize>) -> EngineResult<(broadcast::Receiver<ServerEvent>, GameSnapshot)> {
        match self.send(Command::Subscribe { viewer_seat }).await? {
            CommandReply::Subscription(rx, snapshot) => Ok((rx, snapshot)),
            _ => unreachable!("Subscribe always replies with Subscription"),
        }
    }

    pub async fn join_table(&self, player_id: String, buy_in: u64) -> EngineResult<usize> {
        match self.send(Command::JoinTable { player_id, buy_in }).await? {
            CommandReply::SeatIndex(seat) => Ok(seat),
            _ => unreachable!("JoinTable always replies with SeatIndex"),
        }
    }

    pub async fn start_game(&self) -> EngineResult<()> {
        self.send(Command::StartGame).await.map(|_| ())
    }

    pub async fn submit_action(&self, seat: usize, action: Action) -> EngineResult<()> {
        self.send(Command::SubmitAction { seat, action }).await.map(|_| ())
    }

    pub async fn ready_up(&self, seat: usize, ready: bool) -> EngineResult<()> {
        self.send(Command::ReadyUp { seat, ready }).await.map(|_| ())
    }

    pub async fn cash_out(&self, seat: usize) -> EngineResult<()> {
        self.send(Command::CashOut { seat }).await.map(|_| ())
    }

    pub async fn buy_back_in(&self, seat: usize, amount: u64) -> EngineResult<()> {
        self.send(Command::BuyBackIn { seat, amount }).await.map(|_| ())
    }

    pub async fn leave(&self, seat: usize) -> EngineResult<u64> {
        match self.send(Command::Leave { seat }).await? {
            CommandReply::Bankroll(bankroll) => Ok(bankroll),
            _ => unreachable!("Leave always replies with Bankroll"),
        }
    }

    pub async fn snapshot(&self, viewer_seat: Option<usize>) -> EngineResult<GameSnapshot> {
        match self.send(Command::Snapshot { viewer_seat }).await? {
            CommandReply::Snapshot(snapshot) => Ok(snapshot),
            _ => unreachable!("Snapshot always replies with Snapshot"),
        }
    }

    pub async fn hand_history(&self) -> EngineResult<Vec<HandHistory>> {
        match self.send(Command::HandHistory).await? {
            CommandReply::History(history) => Ok(history),
            _ => unreachable!("HandHistory always replies with History"),
        }
    }
}

/// What a retried `ready`/`cash_out`/`buy_back_in` call replays instead of
/// re-applying, keyed by `(seat, hand_number)` per `spec.md` §4.5.
enum IdempotentOutcome {
    Ready(bool),
    CashedOut,
    BoughtBackIn(u64),
}

/// One Tokio task per table, owning the only mutable reference to its
/// `Game`. Commands are processed strictly in arrival order off a bounded
/// `mpsc` channel — generalizing the teacher's single-writer `TableActor`,
/// but with `try_send` over an unbounded sender so a saturated queue can
/// reject with `TABLE_BUSY` instead of growing without bound.
struct TableActor {
    table_id: String,
    game: Game,
    config: TableConfig,
    store: Arc<dyn TableStore>,
    broadcaster: Broadcaster,
    rng: StdRng,
    rx: mpsc::Receiver<Envelope>,
    action_deadline: Option<Instant>,
    ready_deadline: Option<Instant>,
    idempotency: HashMap<(usize, u64), IdempotentOutcome>,
}

/// Spawns a table actor and returns the handle used to talk to it. Never
/// runs the engine on the caller's task: every mutation crosses the channel.
pub fn spawn(table_id: String, config: TableConfig, store: Arc<dyn TableStore>) -> EngineResult<TableHandle> {
    config.validate()?;
    let game = Game::new(config.to_engine_config())?;
    let (tx, rx) = mpsc::channel(config.command_queue_capacity);
    let broadcaster = Broadcaster::new(config.command_queue_capacity.max(16));
    let seed = rand::rng().next_u64();
    let actor = TableActor {
        table_id: table_id.clone(),
        game,
        config,
        store,
        broadcaster,
        rng: StdRng::seed_from_u64(seed),
        rx,
        action_deadline: None,
        ready_deadline: None,
        idempotency: HashMap::new(),
    };
    tokio::spawn(actor.run());
    Ok(TableHandle { table_id, tx })
}

impl TableActor {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(Duration::from_millis(200));
        loop {
            tokio::select! {
                envelope = self.rx.recv() => {
                    match envelope {
                        Some(envelope) => self.handle(envelope).await,
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    self.on_tick();
                }
            }
        }
        info!(table_id = %self.table_id, "table actor shutting down, all handles dropped");
    }

    #[instrument(skip(self, envelope), fields(table_id = %self.table_id))]
    async fn handle(&mut self, envelope: Envelope) {
        let Envelope { command, reply } = envelope;
        let result = self.dispatch(command);
        if let Err(err) = &result {
            warn!(kind = ?err.kind, message = %err.message, "command rejected");
            self.broadcaster.publish_rejection(err.kind, err.message.clone());
        }
        let _ = reply.send(result);
    }

    fn dispatch(&mut self, command: Command) -> EngineResult<CommandReply> {
        match command {
            Command::Subscribe { viewer_seat } => {
                let rx = self.broadcaster.subscribe();
                let snapshot = project_for_viewer(&self.game.snapshot(), viewer_seat);
                Ok(CommandReply::Subscription(rx, snapshot))
            }
            Command::JoinTable { player_id, buy_in } => {
                let seat = self.game.join_any_seat(player_id.clone(), buy_in)?;
                self.store.upsert_player_game(PlayerGameRecord {
                    game_id: self.table_id.clone(),
                    seat_index: seat,
                    player_id,
                });
                self.after_mutation();
                Ok(CommandReply::SeatIndex(seat))
            }
            Command::StartGame => {
                self.game.start_game(&mut self.rng)?;
                self.arm_action_timer();
                self.after_mutation();
                Ok(CommandReply::Unit)
            }
            Command::SubmitAction { seat, action } => {
                let outcome = self.game.apply_action(seat, action)?;
                if let Some(record) = self.game.action_log().last() {
                    self.store.append_action(&self.table_id, record.clone());
                }
                self.finalize_action_outcome(outcome);
                Ok(CommandReply::Unit)
            }
            Command::ReadyUp { seat, ready } => {
                let key = (seat, self.game.hand_count);
                if let Some(IdempotentOutcome::Ready(previous)) = self.idempotency.get(&key) {
                    if *previous == ready {
                        return Ok(CommandReply::Unit);
                    }
                }
                self.game.ready_up(seat, ready)?;
                self.idempotency.insert(key, IdempotentOutcome::Ready(ready));
                if self.game.phase == Phase::WaitingForPlayers && self.ready_deadline.is_none() {
                    self.ready_deadline = Some(Instant::now() + self.config.ready_timeout());
                }
                self.maybe_start_next_hand();
                self.after_mutation();
                Ok(CommandReply::Unit)
            }
            Command::CashOut { seat } => {
                let key = (seat, self.game.hand_count);
                if matches!(self.idempotency.get(&key), Some(IdempotentOutcome::CashedOut)) {
                    return Ok(CommandReply::Unit);
                }
                self.game.cash_out(seat)?;
                self.idempotency.insert(key, IdempotentOutcome::CashedOut);
                self.after_mutation();
                Ok(CommandReply::Unit)
            }
            Command::BuyBackIn { seat, amount } => {
                let key = (seat, self.game.hand_count);
                if let Some(IdempotentOutcome::BoughtBackIn(previous)) = self.idempotency.get(&key) {
                    if *previous == amount {
                        return Ok(CommandReply::Unit);
                    }
                }
                self.game.buy_back_in(seat, amount)?;
                self.idempotency.insert(key, IdempotentOutcome::BoughtBackIn(amount));
                self.after_mutation();
                Ok(CommandReply::Unit)
            }
            Command::Leave { seat } => {
                let bankroll = self.game.leave(seat)?;
                self.after_mutation();
                Ok(CommandReply::Bankroll(bankroll))
            }
            Command::Snapshot { viewer_seat } => {
                Ok(CommandReply::Snapshot(project_for_viewer(&self.game.snapshot(), viewer_seat)))
            }
            Command::HandHistory => Ok(CommandReply::History(self.store.hand_history_for_game(&self.table_id))),
        }
    }

    /// The engine's own `advance_round` already runs the board out when every
    /// remaining seat is all-in (`spec.md` §4.4's advancement loop lives
    /// inside `Game`, not here) — so this only has to rearm or clear the
    /// per-turn timer and persist completed hands.
    ///
    /// `ShowdownReached` is resolved by [`Self::finalize_action_outcome`]
    /// before this is ever called, so it never reaches this match.
    fn on_action_outcome(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Continue | ActionOutcome::RoundAdvanced => {
                self.arm_action_timer();
            }
            ActionOutcome::HandEnded => {
                self.action_deadline = None;
                if let Some(hand) = self.game.hand_history().last() {
                    self.store.append_hand_history(&self.table_id, hand.clone());
                }
                self.ready_deadline = Some(Instant::now() + self.config.ready_timeout());
            }
            ActionOutcome::ShowdownReached => unreachable!("resolved before reaching on_action_outcome"),
        }
    }

    /// Bridges `Game::apply_action`'s outcome to the timer/persistence
    /// bookkeeping, broadcasting the SHOWDOWN phase in its own update before
    /// resolving payout — spec.md's state diagram treats SHOWDOWN as an
    /// independently observable state, not a synonym for "hand just ended".
    fn finalize_action_outcome(&mut self, outcome: ActionOutcome) {
        if matches!(outcome, ActionOutcome::ShowdownReached) {
            self.after_mutation();
            self.game.resolve_pending_showdown();
            self.on_action_outcome(ActionOutcome::HandEnded);
        } else {
            self.on_action_outcome(outcome);
        }
        self.after_mutation();
    }

    fn arm_action_timer(&mut self) {
        self.action_deadline = self.config.action_timeout().map(|d| Instant::now() + d);
    }

    fn maybe_start_next_hand(&mut self) {
        if self.game.phase == Phase::WaitingForPlayers
            && self.game.status == Status::Playing
            && self.game.all_non_cashed_out_ready()
            && self.game.start_next_hand(&mut self.rng).is_ok()
        {
            self.ready_deadline = None;
            self.arm_action_timer();
        }
    }

    fn after_mutation(&mut self) {
        let snapshot = self.game.snapshot();
        self.store.save_snapshot(&self.table_id, snapshot.clone());
        self.broadcaster.publish_update(&snapshot);
        if self.game.status == Status::Finished {
            self.broadcaster.publish_summary_once(&snapshot);
        }
    }

    /// Fires every 200ms (matching the teacher's `Tick` cadence). Starts the
    /// next hand once the ready-timeout elapses even if some seats never
    /// readied up, and resolves a stalled turn as CHECK (not facing a bet)
    /// or FOLD (facing one) once the action-timeout elapses — the documented
    /// policy from `spec.md` §5's open question on disconnected players.
    fn on_tick(&mut self) {
        let now = Instant::now();
        if let Some(deadline) = self.ready_deadline {
            if now >= deadline && self.game.phase == Phase::WaitingForPlayers && self.game.status == Status::Playing {
                self.ready_deadline = None;
                if self.game.start_next_hand(&mut self.rng).is_ok() {
                    self.arm_action_timer();
                    self.after_mutation();
                }
            }
        }
        if let Some(deadline) = self.action_deadline {
            if now >= deadline {
                if let Some(seat) = self.game.current_turn_seat {
                    let facing_bet = self
                        .game
                        .seats
                        .get(seat)
                        .map(|s| s.current_bet < self.game.current_bet)
                        .unwrap_or(false);
                    let action = if facing_bet { Action::Fold } else { Action::Check };
                    match self.game.apply_action(seat, action) {
                        Ok(outcome) => {
                            if let Some(record) = self.game.action_log().last() {
                                self.store.append_action(&self.table_id, record.clone());
                            }
                            self.finalize_action_outcome(outcome);
                        }
                        Err(err) => {
                            warn!(table_id = %self.table_id, kind = ?err.kind, "auto-action on timeout failed");
                            self.action_deadline = None;
                        }
                    }
                }
            }
        }
    }
}
