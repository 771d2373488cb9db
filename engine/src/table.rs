use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::card::{Card, Deck};
use crate::error::{
    already_cashed_out, bad_card, bet_below_min, buy_in_out_of_range, cash_out_during_hand,
    check_when_facing_bet, deck_exhausted, game_not_waiting, insufficient_stack, invalid_action,
    not_cashed_out, not_your_turn, raise_below_min, table_full, EngineResult,
};
use crate::eval::{evaluate_best, HandCategory, HandEvaluation};
use crate::pot::{self, SeatId, SidePot};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Table configuration (`spec.md` §3 Table). Validated once at construction
/// so every `Game` built from it already upholds the buy-in invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    pub max_seats: usize,
    pub small_blind: u64,
    pub big_blind: u64,
    pub min_buy_in: u64,
    pub max_buy_in: u64,
}

impl TableConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if !(2..=10).contains(&self.max_seats) {
            return Err(invalid_action("max_seats must be in [2, 10]"));
        }
        if self.small_blind == 0 {
            return Err(invalid_action("small_blind must be > 0"));
        }
        if self.big_blind < self.small_blind {
            return Err(invalid_action("big_blind must be >= small_blind"));
        }
        if self.min_buy_in < 10 * self.big_blind {
            return Err(invalid_action("min_buy_in must be >= 10 * big_blind"));
        }
        if self.max_buy_in < self.min_buy_in {
            return Err(invalid_action("max_buy_in must be >= min_buy_in"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    WaitingForPlayers,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet(u64),
    /// Raises TO this total round-contribution level (not an increment).
    Raise(u64),
    AllIn,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Fold => "FOLD",
            Action::Check => "CHECK",
            Action::Call => "CALL",
            Action::Bet(_) => "BET",
            Action::Raise(_) => "RAISE",
            Action::AllIn => "ALL_IN",
        }
    }
}

/// A seat bound to a table for the duration of a game (`spec.md`'s PlayerGame).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub seat_index: usize,
    pub player_id: Option<String>,
    pub stack: u64,
    pub starting_stack: u64,
    pub current_bet: u64,
    pub total_bet_this_hand: u64,
    pub hole_cards: Vec<Card>,
    pub is_active: bool,
    pub cashed_out: bool,
    pub ready_for_next_hand: bool,
    pub final_stack: Option<u64>,
    pub is_all_in: bool,
    pub sitting_out: bool,
    #[serde(skip)]
    pub has_acted_this_round: bool,
}

impl Seat {
    fn empty(seat_index: usize) -> Self {
        Self {
            seat_index,
            player_id: None,
            stack: 0,
            starting_stack: 0,
            current_bet: 0,
            total_bet_this_hand: 0,
            hole_cards: Vec::new(),
            is_active: false,
            cashed_out: false,
            ready_for_next_hand: false,
            final_stack: None,
            is_all_in: false,
            sitting_out: false,
            has_acted_this_round: false,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.player_id.is_some()
    }

    fn is_in_hand(&self) -> bool {
        self.is_occupied() && !self.cashed_out && !self.sitting_out
    }
}

/// One accepted action, appended to the per-game log (`spec.md`'s GameAction record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameActionRecord {
    pub seat: usize,
    pub action: Action,
    pub amount: u64,
    pub phase: Phase,
    pub hand_number: u64,
    /// Milliseconds since the Unix epoch when the action was accepted.
    pub timestamp_millis: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    Showdown,
    AllOthersFolded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatWinner {
    pub seat: usize,
    pub amount: u64,
    pub hand_category: Option<HandCategory>,
    pub best_five: Option<Vec<Card>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotOutcome {
    pub amount: u64,
    pub winners: Vec<SeatWinner>,
}

/// Tagged result of a completed hand, replacing the source's dynamic JSON
/// `winner_info` field (see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinnerInfo {
    pub reason: WinReason,
    pub pots: Vec<PotOutcome>,
    pub shown_hole_cards: Vec<(usize, Vec<Card>)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatContribution {
    pub seat: usize,
    pub total_bet_this_hand: u64,
}

/// Immutable record of one completed hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandHistory {
    pub hand_number: u64,
    pub dealer_seat: usize,
    pub community_cards: Vec<Card>,
    pub pot_total: u64,
    pub winner_info: WinnerInfo,
    pub contributions: Vec<SeatContribution>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action was applied; the same betting round continues.
    Continue,
    /// The betting round closed and the engine dealt into a new phase.
    RoundAdvanced,
    /// The betting round closed into SHOWDOWN, but payout hasn't run yet —
    /// `phase` is independently observable here before `resolve_pending_showdown`
    /// moves the game on to WAITING_FOR_PLAYERS.
    ShowdownReached,
    /// The hand is over (showdown payout applied, or all-others-folded fast path).
    HandEnded,
}

/// Internal result of closing a betting round — kept separate from
/// [`ActionOutcome`] since `advance_round` never resolves payout itself.
enum RoundAdvance {
    Continues,
    ShowdownPending,
}

/// Per-table authoritative game state: the C4 state machine. Pure, no I/O, no
/// async — every mutation is a plain `&mut self` method returning `Result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub table: TableConfig,
    pub status: Status,
    pub phase: Phase,
    pub seats: Vec<Seat>,
    pub community_cards: Vec<Card>,
    pub dealer_seat: Option<usize>,
    pub current_turn_seat: Option<usize>,
    pub current_bet: u64,
    pub last_raise_increment: u64,
    pub last_aggressor_seat: Option<usize>,
    pub hand_count: u64,
    pub winner_info: Option<WinnerInfo>,
    pub game_summary: Option<GameSummary>,
    #[serde(skip)]
    deck: Deck,
    action_log: Vec<GameActionRecord>,
    hand_history: Vec<HandHistory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatSummary {
    pub seat: usize,
    pub starting_stack: u64,
    pub final_stack: u64,
    pub win_loss: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub seats: Vec<SeatSummary>,
}

impl Game {
    pub fn new(table: TableConfig) -> EngineResult<Self> {
        table.validate()?;
        let max_seats = table.max_seats;
        Ok(Self {
            table,
            status: Status::Waiting,
            phase: Phase::WaitingForPlayers,
            seats: (0..max_seats).map(Seat::empty).collect(),
            community_cards: Vec::new(),
            dealer_seat: None,
            current_turn_seat: None,
            current_bet: 0,
            last_raise_increment: 0,
            last_aggressor_seat: None,
            hand_count: 0,
            winner_info: None,
            game_summary: None,
            deck: Deck::new_shuffled(&mut rand::rng()),
            action_log: Vec::new(),
            hand_history: Vec::new(),
        })
    }

    pub fn action_log(&self) -> &[GameActionRecord] {
        &self.action_log
    }

    pub fn hand_history(&self) -> &[HandHistory] {
        &self.hand_history
    }

    pub fn pot(&self) -> u64 {
        self.seats.iter().map(|s| s.total_bet_this_hand).sum()
    }

    // ---- C7 lifecycle -----------------------------------------------------

    /// Seats the player in the first open seat. Joining during an active hand
    /// places the seat in sit-out until the next hand.
    pub fn join_any_seat(&mut self, player_id: String, buy_in: u64) -> EngineResult<usize> {
        if buy_in < self.table.min_buy_in || buy_in > self.table.max_buy_in {
            return Err(buy_in_out_of_range(format!(
                "buy_in {buy_in} outside [{}, {}]",
                self.table.min_buy_in, self.table.max_buy_in
            )));
        }
        let mid_hand = !matches!(self.phase, Phase::WaitingForPlayers);
        let seat = self
            .seats
            .iter_mut()
            .find(|s| !s.is_occupied())
            .ok_or_else(|| table_full("no open seats"))?;
        let idx = seat.seat_index;
        *seat = Seat {
            player_id: Some(player_id),
            stack: buy_in,
            starting_stack: buy_in,
            sitting_out: mid_hand,
            ..Seat::empty(idx)
        };
        info!(seat = idx, buy_in, "seat_joined");
        Ok(idx)
    }

    pub fn start_game(&mut self, rng: &mut impl RngCore) -> EngineResult<()> {
        if self.status != Status::Waiting {
            return Err(game_not_waiting("game has already started"));
        }
        let funded = self
            .seats
            .iter()
            .filter(|s| s.is_occupied() && !s.cashed_out && s.stack > 0)
            .count();
        if funded < 2 {
            return Err(invalid_action("need at least 2 seated, funded seats to start"));
        }
        self.status = Status::Playing;
        self.start_hand(rng)
    }

    pub fn ready_up(&mut self, seat_index: usize, ready: bool) -> EngineResult<()> {
        let seat = self.seat_mut(seat_index)?;
        if seat.cashed_out {
            return Err(already_cashed_out("cannot ready up while cashed out"));
        }
        seat.ready_for_next_hand = ready;
        Ok(())
    }

    pub fn all_non_cashed_out_ready(&self) -> bool {
        self.seats
            .iter()
            .filter(|s| s.is_occupied() && !s.cashed_out)
            .all(|s| s.ready_for_next_hand)
    }

    /// Starts the next hand once the engine is parked at WAITING_FOR_PLAYERS.
    pub fn start_next_hand(&mut self, rng: &mut impl RngCore) -> EngineResult<()> {
        if self.phase != Phase::WaitingForPlayers {
            return Err(invalid_action("hand already in progress"));
        }
        self.start_hand(rng)
    }

    pub fn cash_out(&mut self, seat_index: usize) -> EngineResult<()> {
        if matches!(self.phase, Phase::Preflop | Phase::Flop | Phase::Turn | Phase::River) {
            return Err(cash_out_during_hand("cannot cash out during an active betting round"));
        }
        let seat = self.seat_mut(seat_index)?;
        if seat.cashed_out {
            return Ok(()); // idempotent no-op
        }
        seat.final_stack = Some(seat.stack);
        seat.cashed_out = true;
        seat.is_active = false;
        seat.ready_for_next_hand = false;
        info!(seat = seat_index, final_stack = ?seat.final_stack, "seat_cashed_out");
        self.maybe_finish();
        Ok(())
    }

    pub fn buy_back_in(&mut self, seat_index: usize, amount: u64) -> EngineResult<()> {
        if amount < self.table.min_buy_in || amount > self.table.max_buy_in {
            return Err(buy_in_out_of_range(format!(
                "buy_in {amount} outside [{}, {}]",
                self.table.min_buy_in, self.table.max_buy_in
            )));
        }
        let seat = self.seat_mut(seat_index)?;
        if !seat.cashed_out {
            return Err(not_cashed_out("buy_back_in is only legal while cashed out"));
        }
        seat.cashed_out = false;
        seat.stack = amount;
        seat.starting_stack = amount;
        seat.final_stack = None;
        seat.ready_for_next_hand = false;
        info!(seat = seat_index, amount, "seat_bought_back_in");
        Ok(())
    }

    /// Releases the seat and returns the bankroll credit due the player.
    pub fn leave(&mut self, seat_index: usize) -> EngineResult<u64> {
        let seat = self.seat_mut(seat_index)?;
        if !seat.cashed_out {
            return Err(not_cashed_out("leave is only legal while cashed out"));
        }
        let bankroll = seat.final_stack.unwrap_or(seat.stack);
        let idx = seat.seat_index;
        self.seats[idx] = Seat::empty(idx);
        info!(seat = idx, bankroll, "seat_left");
        Ok(bankroll)
    }

    fn maybe_finish(&mut self) {
        let occupied: Vec<&Seat> = self.seats.iter().filter(|s| s.is_occupied()).collect();
        if occupied.is_empty() || !occupied.iter().all(|s| s.cashed_out) {
            return;
        }
        let seats = occupied
            .iter()
            .map(|s| SeatSummary {
                seat: s.seat_index,
                starting_stack: s.starting_stack,
                final_stack: s.final_stack.unwrap_or(s.stack),
                win_loss: s.final_stack.unwrap_or(s.stack) as i64 - s.starting_stack as i64,
            })
            .collect::<Vec<_>>();
        let mut seats = seats;
        seats.sort_by(|a, b| b.win_loss.cmp(&a.win_loss));
        self.status = Status::Finished;
        self.game_summary = Some(GameSummary { seats });
        info!(table = %self.table.name, "game_finished");
    }

    // ---- C4 state machine ---------------------------------------------------

    fn seat_mut(&mut self, seat_index: usize) -> EngineResult<&mut Seat> {
        self.seats
            .get_mut(seat_index)
            .filter(|s| s.is_occupied())
            .ok_or_else(|| invalid_action(format!("seat {seat_index} is not occupied")))
    }

    fn seat(&self, seat_index: usize) -> EngineResult<&Seat> {
        self.seats
            .get(seat_index)
            .filter(|s| s.is_occupied())
            .ok_or_else(|| invalid_action(format!("seat {seat_index} is not occupied")))
    }

    pub fn heads_up(&self) -> bool {
        self.seats.iter().filter(|s| s.is_in_hand() && s.stack + s.total_bet_this_hand > 0).count() == 2
    }

    fn next_seat_clockwise(&self, from: usize, predicate: impl Fn(&Seat) -> bool) -> Option<usize> {
        let n = self.seats.len();
        for step in 1..=n {
            let idx = (from + step) % n;
            if predicate(&self.seats[idx]) {
                return Some(idx);
            }
        }
        None
    }

    fn start_hand(&mut self, rng: &mut impl RngCore) -> EngineResult<()> {
        // 1. rotate dealer among non-cashed-out occupied seats.
        let eligible = |s: &Seat| s.is_occupied() && !s.cashed_out;
        self.dealer_seat = Some(match self.dealer_seat {
            None => self
                .seats
                .iter()
                .find(|s| eligible(s))
                .map(|s| s.seat_index)
                .ok_or_else(|| invalid_action("no seated players"))?,
            Some(prev) => self
                .next_seat_clockwise(prev, eligible)
                .ok_or_else(|| invalid_action("no seated players"))?,
        });
        let dealer = self.dealer_seat.unwrap();

        // 2. clear per-hand state.
        self.community_cards.clear();
        self.current_bet = 0;
        self.last_raise_increment = self.table.big_blind;
        self.winner_info = None;
        for seat in &mut self.seats {
            seat.hole_cards.clear();
            seat.current_bet = 0;
            seat.total_bet_this_hand = 0;
            seat.is_all_in = false;
            seat.has_acted_this_round = false;
            if seat.is_occupied() && !seat.cashed_out {
                seat.ready_for_next_hand = false;
                seat.sitting_out = false;
            }
        }

        // 3. mark active seats (funded, non-cashed-out).
        for seat in &mut self.seats {
            seat.is_active = seat.is_occupied() && !seat.cashed_out && seat.stack > 0;
        }

        // 4. fresh deck; deal 2 hole cards clockwise starting left of dealer.
        self.deck = Deck::new_shuffled(rng);
        let order = self.seat_order_from(dealer, |s| s.is_active);
        if order.len() < 2 {
            return Err(invalid_action("need at least 2 active seats to start a hand"));
        }
        for _ in 0..2 {
            for &idx in &order {
                self.deck.burn_or_deal_hole(&mut self.seats[idx])?;
            }
        }

        // 5. post blinds. Heads-up: dealer is SB.
        let (sb_idx, bb_idx) = if order.len() == 2 {
            (dealer, order[0])
        } else {
            (order[0], order[1])
        };
        let sb_amount = self.table.small_blind.min(self.seats[sb_idx].stack);
        Self::post_blind(&mut self.seats[sb_idx], sb_amount);
        let bb_amount = self.table.big_blind.min(self.seats[bb_idx].stack);
        Self::post_blind(&mut self.seats[bb_idx], bb_amount);

        self.hand_count += 1;
        self.phase = Phase::Preflop;
        self.current_bet = self.seats[bb_idx].current_bet;
        self.last_aggressor_seat = Some(bb_idx);
        // Heads-up: dealer (SB) acts first preflop, which is just "left of BB"
        // here since order=[SB, BB] and left of BB wraps back to SB.
        self.current_turn_seat = self.next_seat_clockwise(bb_idx, |s| s.is_active);
        info!(hand_number = self.hand_count, dealer, "hand_started");
        Ok(())
    }

    fn post_blind(seat: &mut Seat, amount: u64) {
        seat.stack -= amount;
        seat.current_bet += amount;
        seat.total_bet_this_hand += amount;
        if seat.stack == 0 {
            seat.is_all_in = true;
        }
    }

    /// Seats clockwise starting immediately after `from`, filtered by `predicate`.
    fn seat_order_from(&self, from: usize, predicate: impl Fn(&Seat) -> bool) -> Vec<usize> {
        let n = self.seats.len();
        (1..=n)
            .map(|step| (from + step) % n)
            .filter(|&idx| predicate(&self.seats[idx]))
            .collect()
    }

    fn folded_or_out(seat: &Seat) -> bool {
        !seat.is_active
    }

    fn still_in_hand(&self, idx: usize) -> bool {
        let s = &self.seats[idx];
        s.is_active && !Self::folded_or_out(s)
    }

    fn seats_in_hand(&self) -> Vec<usize> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(i, _)| self.still_in_hand(*i))
            .map(|(i, _)| i)
            .collect()
    }

    /// Applies one action from the seat currently on the clock.
    pub fn apply_action(&mut self, seat_index: usize, action: Action) -> EngineResult<ActionOutcome> {
        if !matches!(self.phase, Phase::Preflop | Phase::Flop | Phase::Turn | Phase::River) {
            return Err(invalid_action("no betting round is active"));
        }
        if self.current_turn_seat != Some(seat_index) {
            return Err(not_your_turn(format!("seat {seat_index} is not on the clock")));
        }
        self.seat(seat_index)?;

        let hand_number = self.hand_count;
        let phase = self.phase;
        let (recorded_action, recorded_amount) = self.apply_action_inner(seat_index, action)?;
        self.action_log.push(GameActionRecord {
            seat: seat_index,
            action: recorded_action,
            amount: recorded_amount,
            phase,
            hand_number,
            timestamp_millis: now_millis(),
        });
        info!(hand_number, seat = seat_index, ?recorded_action, amount = recorded_amount, ?phase, "action_accepted");

        let in_hand = self.seats_in_hand();
        if in_hand.len() <= 1 {
            self.resolve_all_folded(in_hand.first().copied());
            return Ok(ActionOutcome::HandEnded);
        }

        if self.is_round_closed() {
            return Ok(match self.advance_round()? {
                RoundAdvance::ShowdownPending => ActionOutcome::ShowdownReached,
                RoundAdvance::Continues => ActionOutcome::RoundAdvanced,
            });
        }

        self.current_turn_seat = self.next_seat_clockwise(seat_index, |s| {
            s.is_active && !s.is_all_in
        });
        Ok(ActionOutcome::Continue)
    }

    fn apply_action_inner(&mut self, seat_index: usize, action: Action) -> EngineResult<(Action, u64)> {
        let big_blind = self.table.big_blind;
        let current_bet = self.current_bet;
        let last_raise_increment = self.last_raise_increment;
        let seat = &mut self.seats[seat_index];
        let to_call = current_bet.saturating_sub(seat.current_bet);

        match action {
            Action::Fold => {
                seat.is_active = false;
                seat.has_acted_this_round = true;
                Ok((Action::Fold, 0))
            }
            Action::Check => {
                if to_call != 0 {
                    return Err(check_when_facing_bet("cannot check while facing a bet"));
                }
                seat.has_acted_this_round = true;
                Ok((Action::Check, 0))
            }
            Action::Call => {
                if to_call == 0 {
                    return Err(invalid_action("nothing to call"));
                }
                let pay = to_call.min(seat.stack);
                Self::commit(seat, pay);
                seat.has_acted_this_round = true;
                Ok((Action::Call, pay))
            }
            Action::Bet(amount) => {
                if current_bet != 0 {
                    return Err(invalid_action("cannot BET while facing a bet; use RAISE"));
                }
                if amount == 0 || amount > seat.stack {
                    return Err(insufficient_stack("bet amount exceeds stack"));
                }
                if amount < big_blind {
                    return Err(bet_below_min(format!("bet must be >= big blind ({big_blind})")));
                }
                Self::commit(seat, amount);
                seat.has_acted_this_round = true;
                self.reopen_after_aggression(seat_index, amount, amount);
                Ok((Action::Bet(amount), amount))
            }
            Action::Raise(to_amount) => {
                if current_bet == 0 {
                    return Err(invalid_action("no bet to raise; use BET"));
                }
                let min_to = current_bet + last_raise_increment.max(big_blind);
                let max_to = seat.stack + seat.current_bet;
                if to_amount > max_to {
                    return Err(insufficient_stack("raise exceeds stack"));
                }
                if to_amount < min_to && to_amount < max_to {
                    return Err(raise_below_min(format!("raise must reach at least {min_to}")));
                }
                let pay = to_amount - seat.current_bet;
                Self::commit(seat, pay);
                seat.has_acted_this_round = true;
                let increment = to_amount - current_bet;
                self.reopen_after_aggression(seat_index, to_amount, increment);
                Ok((Action::Raise(to_amount), pay))
            }
            Action::AllIn => {
                if seat.stack == 0 {
                    return Err(invalid_action("no chips to go all-in with"));
                }
                let pay = seat.stack;
                let to_amount = seat.current_bet + pay;
                Self::commit(seat, pay);
                seat.has_acted_this_round = true;
                if current_bet == 0 {
                    self.reopen_after_aggression(seat_index, to_amount, to_amount);
                } else if to_amount > current_bet {
                    let increment = to_amount - current_bet;
                    self.reopen_after_aggression(seat_index, to_amount, increment);
                } else {
                    // short all-in call: does not reopen the round.
                    self.seats[seat_index].has_acted_this_round = true;
                }
                Ok((Action::AllIn, pay))
            }
        }
    }

    fn commit(seat: &mut Seat, amount: u64) {
        seat.stack -= amount;
        seat.current_bet += amount;
        seat.total_bet_this_hand += amount;
        if seat.stack == 0 {
            seat.is_all_in = true;
        }
    }

    /// Updates `current_bet`/aggressor state after a bet/raise/all-in. Only a
    /// "full" increase (>= the larger of the previous minimum raise and the
    /// big blind) reopens the round for seats that already matched the prior
    /// level; an undersized all-in raise still raises `current_bet` (others
    /// must call it or fold) but leaves `last_raise_increment` untouched, so
    /// a later re-raise is still measured against the pre-existing minimum.
    fn reopen_after_aggression(&mut self, seat_index: usize, new_to_amount: u64, increment: u64) {
        self.current_bet = new_to_amount;
        let full_raise = increment >= self.last_raise_increment.max(self.table.big_blind);
        if full_raise {
            self.last_aggressor_seat = Some(seat_index);
            self.last_raise_increment = increment;
            for (idx, seat) in self.seats.iter_mut().enumerate() {
                if idx != seat_index && seat.is_active && !seat.is_all_in {
                    seat.has_acted_this_round = false;
                }
            }
        }
    }

    fn is_round_closed(&self) -> bool {
        let current_bet = self.current_bet;
        self.seats.iter().filter(|s| s.is_active).all(|s| {
            s.is_all_in || (s.has_acted_this_round && s.current_bet == current_bet)
        })
    }

    /// Advances past a closed betting round: deals the next street (or parks
    /// at SHOWDOWN), resetting round-local bookkeeping. Payout is deliberately
    /// left to [`Game::resolve_pending_showdown`] so SHOWDOWN is an
    /// independently observable phase, not a phase that's entered and left in
    /// the same call.
    fn advance_round(&mut self) -> EngineResult<RoundAdvance> {
        loop {
            for seat in &mut self.seats {
                seat.current_bet = 0;
                seat.has_acted_this_round = false;
            }
            self.current_bet = 0;
            self.last_raise_increment = self.table.big_blind;

            self.phase = match self.phase {
                Phase::Preflop => {
                    self.deck.burn()?;
                    self.community_cards.extend(self.deck.deal(3)?);
                    Phase::Flop
                }
                Phase::Flop => {
                    self.deck.burn()?;
                    self.community_cards.extend(self.deck.deal(1)?);
                    Phase::Turn
                }
                Phase::Turn => {
                    self.deck.burn()?;
                    self.community_cards.extend(self.deck.deal(1)?);
                    Phase::River
                }
                Phase::River => Phase::Showdown,
                other => other,
            };

            if self.phase == Phase::Showdown {
                return Ok(RoundAdvance::ShowdownPending);
            }

            let dealer = self.dealer_seat.unwrap();
            let actionable = self.seat_order_from(dealer, |s| s.is_active && !s.is_all_in);
            let anyone_in_hand = self.seats.iter().any(|s| s.is_active);
            if actionable.is_empty() && anyone_in_hand {
                // Everyone left is all-in: keep dealing straight through.
                continue;
            }
            self.current_turn_seat = actionable.first().copied();
            return Ok(RoundAdvance::Continues);
        }
    }

    /// Resolves payout for a hand parked at SHOWDOWN by
    /// [`Game::apply_action`] (`ActionOutcome::ShowdownReached`) and moves the
    /// game on to WAITING_FOR_PLAYERS. No-op if the game isn't at SHOWDOWN.
    pub fn resolve_pending_showdown(&mut self) {
        if self.phase == Phase::Showdown {
            self.resolve_showdown();
        }
    }

    fn resolve_all_folded(&mut self, winner_seat: Option<usize>) {
        let pot_total = self.pot();
        let contributions: Vec<SeatContribution> = self
            .seats
            .iter()
            .filter(|s| s.total_bet_this_hand > 0)
            .map(|s| SeatContribution { seat: s.seat_index, total_bet_this_hand: s.total_bet_this_hand })
            .collect();

        let winner_info = if let Some(winner) = winner_seat {
            let payouts = pot::single_winner_payout(winner, pot_total);
            self.apply_payouts(&payouts);
            WinnerInfo {
                reason: WinReason::AllOthersFolded,
                pots: vec![PotOutcome {
                    amount: pot_total,
                    winners: vec![SeatWinner { seat: winner, amount: pot_total, hand_category: None, best_five: None }],
                }],
                shown_hole_cards: Vec::new(),
            }
        } else {
            WinnerInfo { reason: WinReason::AllOthersFolded, pots: Vec::new(), shown_hole_cards: Vec::new() }
        };

        self.finish_hand(winner_info, contributions, pot_total);
    }

    fn resolve_showdown(&mut self) {
        let showdown_eligible: HashSet<SeatId> =
            self.seats.iter().filter(|s| s.is_active).map(|s| s.seat_index).collect();
        let contributions: Vec<(SeatId, u64)> = self
            .seats
            .iter()
            .filter(|s| s.total_bet_this_hand > 0)
            .map(|s| (s.seat_index, s.total_bet_this_hand))
            .collect();
        let pot_total: u64 = contributions.iter().map(|(_, c)| c).sum();

        let mut evaluations = std::collections::HashMap::new();
        let mut best_fives = std::collections::HashMap::new();
        for &seat_idx in &showdown_eligible {
            let mut cards = self.seats[seat_idx].hole_cards.clone();
            cards.extend(self.community_cards.iter().copied());
            let (eval, five) = evaluate_best(&cards);
            evaluations.insert(seat_idx, eval);
            best_fives.insert(seat_idx, five);
        }

        let side_pots: Vec<SidePot> = pot::compute_side_pots(&contributions, &showdown_eligible);
        let dealer = self.dealer_seat.unwrap_or(0);
        let seat_order: Vec<SeatId> = (0..self.seats.len()).collect();
        let payouts = pot::distribute(&side_pots, &evaluations, dealer, &seat_order);
        self.apply_payouts(&payouts);

        let pots: Vec<PotOutcome> = side_pots
            .into_iter()
            .filter(|p| p.amount > 0 && !p.eligible.is_empty())
            .map(|p| {
                let best_eval = p.eligible.iter().filter_map(|s| evaluations.get(s)).max().copied();
                let winners: Vec<SeatWinner> = p
                    .eligible
                    .iter()
                    .filter(|s| evaluations.get(s) == best_eval.as_ref())
                    .map(|&s| SeatWinner {
                        seat: s,
                        amount: *payouts.get(&s).unwrap_or(&0),
                        hand_category: evaluations.get(&s).map(|e| e.category),
                        best_five: best_fives.get(&s).cloned(),
                    })
                    .collect();
                PotOutcome { amount: p.amount, winners }
            })
            .collect();

        let shown_hole_cards = showdown_eligible
            .iter()
            .map(|&s| (s, self.seats[s].hole_cards.clone()))
            .collect();

        let winner_info = WinnerInfo { reason: WinReason::Showdown, pots, shown_hole_cards };
        let contribution_records = contributions
            .into_iter()
            .map(|(seat, total_bet_this_hand)| SeatContribution { seat, total_bet_this_hand })
            .collect();
        self.finish_hand(winner_info, contribution_records, pot_total);
    }

    fn apply_payouts(&mut self, payouts: &std::collections::HashMap<SeatId, u64>) {
        for (&seat_idx, &amount) in payouts {
            self.seats[seat_idx].stack += amount;
        }
    }

    fn finish_hand(&mut self, winner_info: WinnerInfo, contributions: Vec<SeatContribution>, pot_total: u64) {
        self.hand_history.push(HandHistory {
            hand_number: self.hand_count,
            dealer_seat: self.dealer_seat.unwrap_or(0),
            community_cards: self.community_cards.clone(),
            pot_total,
            winner_info: winner_info.clone(),
            contributions,
        });
        self.winner_info = Some(winner_info);
        for seat in &mut self.seats {
            seat.current_bet = 0;
            seat.total_bet_this_hand = 0;
            seat.is_active = false;
            seat.is_all_in = false;
        }
        self.phase = Phase::WaitingForPlayers;
        self.current_turn_seat = None;
    }
}

impl Deck {
    /// Helper used only by `Game::start_hand`: deals one hole card into `seat`.
    fn burn_or_deal_hole(&mut self, seat: &mut Seat) -> EngineResult<()> {
        let card = self.deal(1)?.pop().ok_or_else(|| deck_exhausted("no card to deal"))?;
        seat.hole_cards.push(card);
        Ok(())
    }
}

/// Parses a list of `"AS"`-style card strings, used by tests and any
/// operator tooling that needs to construct a fixed board.
pub fn parse_cards(specs: &[&str]) -> EngineResult<Vec<Card>> {
    specs.iter().map(|s| Card::parse(s).map_err(|_| bad_card(format!("bad card {s:?}")))).collect()
}

/// Read-only per-seat view for [`GameSnapshot`]. Drops `has_acted_this_round`,
/// which is round-closure bookkeeping with no meaning to an observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatView {
    pub seat_index: usize,
    pub player_id: Option<String>,
    pub stack: u64,
    pub current_bet: u64,
    pub total_bet_this_hand: u64,
    pub hole_cards: Vec<Card>,
    pub is_active: bool,
    pub cashed_out: bool,
    pub ready_for_next_hand: bool,
    pub is_all_in: bool,
    pub sitting_out: bool,
}

impl From<&Seat> for SeatView {
    fn from(s: &Seat) -> Self {
        Self {
            seat_index: s.seat_index,
            player_id: s.player_id.clone(),
            stack: s.stack,
            current_bet: s.current_bet,
            total_bet_this_hand: s.total_bet_this_hand,
            hole_cards: s.hole_cards.clone(),
            is_active: s.is_active,
            cashed_out: s.cashed_out,
            ready_for_next_hand: s.ready_for_next_hand,
            is_all_in: s.is_all_in,
            sitting_out: s.sitting_out,
        }
    }
}

/// The unfiltered, fully-owned view of a table a broadcaster projects from.
/// Every seat's hole cards are present here; card-privacy masking is the
/// broadcaster's job, not the engine's (`spec.md` §6.1's filter rule).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub table_name: String,
    pub max_seats: usize,
    pub status: Status,
    pub phase: Phase,
    pub seats: Vec<SeatView>,
    pub community_cards: Vec<Card>,
    pub dealer_seat: Option<usize>,
    pub current_turn_seat: Option<usize>,
    pub current_bet: u64,
    pub pot: u64,
    pub hand_count: u64,
    pub winner_info: Option<WinnerInfo>,
    pub game_summary: Option<GameSummary>,
}

impl Game {
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            table_name: self.table.name.clone(),
            max_seats: self.table.max_seats,
            status: self.status,
            phase: self.phase,
            seats: self.seats.iter().map(SeatView::from).collect(),
            community_cards: self.community_cards.clone(),
            dealer_seat: self.dealer_seat,
            current_turn_seat: self.current_turn_seat,
            current_bet: self.current_bet,
            pot: self.pot(),
            hand_count: self.hand_count,
            winner_info: self.winner_info.clone(),
            game_summary: self.game_summary.clone(),
        }
    }
}
