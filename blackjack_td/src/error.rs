use thiserror::Error;

use crate::simulation::{Card, GamePhase};

/// Errors raised by the shoe, the game engine and the learner. None of them is
/// recoverable in the middle of a round.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("mismatch in true count: expected {expected}, but got {actual}")]
    StateMismatch { expected: i32, actual: i32 },

    #[error("cannot draw from an empty shoe")]
    EmptyShoe,

    #[error("decks remaining rounds to zero with {cards_remaining} cards left")]
    DivisionByZero { cards_remaining: usize },

    #[error("invalid action {0}: expected 0 (stand) or 1 (hit)")]
    InvalidAction(u8),

    #[error("{operation} is only allowed in {allowed} phase, but the game is in {current:?}")]
    PhaseViolation {
        operation: &'static str,
        allowed: &'static str,
        current: GamePhase,
    },

    #[error("cannot settle a round whose outcome is still undecided")]
    RoundInProgress,

    #[error("no {card} left in the shoe")]
    CardUnavailable { card: Card },

    #[error("table has {got} entries, expected {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("invalid rule: {0}")]
    InvalidRule(String),
}
