use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error identifiers shared with clients over the wire (`spec.md` §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotYourTurn,
    InvalidAction,
    InsufficientStack,
    BetBelowMin,
    RaiseBelowMin,
    CheckWhenFacingBet,
    CashOutDuringHand,
    AlreadyCashedOut,
    NotCashedOut,
    BuyInOutOfRange,
    GameNotWaiting,
    TableFull,
    TableBusy,
    GameNotFound,
    DeckExhausted,
    BadCard,
}

/// A single engine error: a stable [`ErrorKind`] plus a human-readable message.
///
/// Every rejection path in the coordinator and table state machine returns
/// this type rather than panicking, so a validation failure never leaves
/// partial state behind.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

macro_rules! err_ctor {
    ($name:ident, $kind:ident) => {
        pub fn $name(message: impl Into<String>) -> EngineError {
            EngineError::new(ErrorKind::$kind, message)
        }
    };
}

err_ctor!(not_your_turn, NotYourTurn);
err_ctor!(invalid_action, InvalidAction);
err_ctor!(insufficient_stack, InsufficientStack);
err_ctor!(bet_below_min, BetBelowMin);
err_ctor!(raise_below_min, RaiseBelowMin);
err_ctor!(check_when_facing_bet, CheckWhenFacingBet);
err_ctor!(cash_out_during_hand, CashOutDuringHand);
err_ctor!(already_cashed_out, AlreadyCashedOut);
err_ctor!(not_cashed_out, NotCashedOut);
err_ctor!(buy_in_out_of_range, BuyInOutOfRange);
err_ctor!(game_not_waiting, GameNotWaiting);
err_ctor!(table_full, TableFull);
err_ctor!(table_busy, TableBusy);
err_ctor!(game_not_found, GameNotFound);
err_ctor!(deck_exhausted, DeckExhausted);
err_ctor!(bad_card, BadCard);

pub type EngineResult<T> = Result<T, EngineError>;
