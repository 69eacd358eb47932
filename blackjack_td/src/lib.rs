pub mod learning;
pub mod simulation;

mod error;

pub use error::Error;
pub use learning::{Hyperparameters, TemporalDifference};
pub use simulation::{BlackjackGame, Card, GamePhase, RoundState, Transition};

use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};

/// Fewest decks the targeted re-seed can work with: it may leave up to 5 decks
/// in the shoe and must have dealt at least one.
pub const MIN_NUMBER_OF_DECKS: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub number_of_decks: u8,
    /// A full reshuffle happens once the remaining cards fall to this share of the shoe.
    pub reshuffle_proportion: f64,
    /// Large bets are placed at or above this true count.
    pub bet_threshold: i32,
    pub small_bet: u32,
    pub large_bet: u32,
    pub payout_blackjack: f64,
}

impl Rule {
    pub fn validate(&self) -> Result<(), Error> {
        if self.number_of_decks < MIN_NUMBER_OF_DECKS {
            return Err(Error::InvalidRule(format!(
                "number_of_decks must be at least {}",
                MIN_NUMBER_OF_DECKS
            )));
        }
        if !(self.reshuffle_proportion > 0.0 && self.reshuffle_proportion < 1.0) {
            return Err(Error::InvalidRule(String::from(
                "reshuffle_proportion must be in (0, 1)",
            )));
        }
        if self.small_bet == 0 || self.large_bet < self.small_bet {
            return Err(Error::InvalidRule(String::from(
                "bets must satisfy 0 < small_bet <= large_bet",
            )));
        }
        if self.payout_blackjack <= 0.0 {
            return Err(Error::InvalidRule(String::from(
                "payout_blackjack must be positive",
            )));
        }
        Ok(())
    }

    /// Number of cards in a full shoe.
    pub fn shoe_size(&self) -> usize {
        self.number_of_decks as usize * 52
    }
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            number_of_decks: 6,
            reshuffle_proportion: 0.25,
            bet_threshold: 2,
            small_bet: 1,
            large_bet: 20,
            payout_blackjack: 1.5,
        }
    }
}

/// Player decision. The discriminant is the action index used by the Q-table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    Stand = 0,
    Hit = 1,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::Stand, Action::Hit];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Action {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Stand),
            1 => Ok(Action::Hit),
            _ => Err(Error::InvalidAction(value)),
        }
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> u8 {
        action as u8
    }
}

/// Result of a round. `InProgress` means nobody has won yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Outcome {
    #[default]
    InProgress,
    Player,
    Dealer,
    Tie,
    /// Player natural, paid at `payout_blackjack`.
    Blackjack,
}

impl Outcome {
    pub fn is_resolved(self) -> bool {
        self != Outcome::InProgress
    }
}

/// Which action the TD target bootstraps from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum LearningPolicy {
    /// SARSA: the action actually selected for the next state.
    OnPolicy,
    /// Q-learning: the greedy action at the next state.
    OffPolicy,
}
