//! Pure, synchronous No-Limit Texas Hold'em rules engine: cards, hand
//! evaluation, pot math, and the per-table state machine. No I/O, no async —
//! callers (the `holdem-server` crate) own persistence, networking, and time.

pub mod card;
pub mod error;
pub mod eval;
pub mod pot;
pub mod table;

pub use card::{Card, Deck, Rank, Suit};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use eval::{evaluate_best, evaluate_five, HandCategory, HandEvaluation};
pub use pot::{compute_side_pots, distribute, single_winner_payout, SeatId, SidePot};
pub use table::{
    parse_cards, Action, ActionOutcome, Game, GameActionRecord, GameSnapshot, GameSummary,
    HandHistory, Phase, PotOutcome, Seat, SeatContribution, SeatSummary, SeatView, SeatWinner,
    Status, TableConfig, WinReason, WinnerInfo,
};
