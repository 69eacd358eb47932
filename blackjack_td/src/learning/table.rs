use std::ops::{Index, IndexMut};

use super::discretizer::{StateIndex, ACE_SIZE, DEALER_SIZE, PLAYER_SIZE, TRUE_COUNT_SIZE};
use crate::{Action, Error};

const ACTION_SIZE: usize = 2;

/// Dimensions of the table: dealer, player, true count, usable ace, action.
pub const SHAPE: [usize; 5] = [DEALER_SIZE, PLAYER_SIZE, TRUE_COUNT_SIZE, ACE_SIZE, ACTION_SIZE];
pub const LEN: usize = DEALER_SIZE * PLAYER_SIZE * TRUE_COUNT_SIZE * ACE_SIZE * ACTION_SIZE;

/// A dense 5-dimensional array of `f64` stored row-major in a flat buffer.
/// It holds both the Q-values and the eligibility traces.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionValueTable {
    data: Vec<f64>,
}

impl ActionValueTable {
    pub fn zeros() -> Self {
        Self {
            data: vec![0.0; LEN],
        }
    }

    /// Rebuilds a table from values laid out as in `as_slice`.
    pub fn from_vec(data: Vec<f64>) -> Result<Self, Error> {
        if data.len() != LEN {
            return Err(Error::ShapeMismatch {
                expected: LEN,
                got: data.len(),
            });
        }
        Ok(Self { data })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Both action values at a state, indexed by `Action::index`.
    pub fn action_values(&self, state: StateIndex) -> [f64; ACTION_SIZE] {
        let offset = offset(state, Action::Stand);
        [self.data[offset], self.data[offset + 1]]
    }

    /// `self += factor * other`, entry by entry.
    pub fn add_scaled(&mut self, factor: f64, other: &ActionValueTable) {
        for (value, delta) in self.data.iter_mut().zip(other.data.iter()) {
            *value += factor * delta;
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for value in self.data.iter_mut() {
            *value *= factor;
        }
    }
}

impl Default for ActionValueTable {
    fn default() -> Self {
        Self::zeros()
    }
}

impl Index<(StateIndex, Action)> for ActionValueTable {
    type Output = f64;
    fn index(&self, (state, action): (StateIndex, Action)) -> &Self::Output {
        &self.data[offset(state, action)]
    }
}

impl IndexMut<(StateIndex, Action)> for ActionValueTable {
    fn index_mut(&mut self, (state, action): (StateIndex, Action)) -> &mut Self::Output {
        &mut self.data[offset(state, action)]
    }
}

fn offset(state: StateIndex, action: Action) -> usize {
    debug_assert!(state.dealer < DEALER_SIZE, "dealer index {} out of range", state.dealer);
    debug_assert!(state.player < PLAYER_SIZE, "player index {} out of range", state.player);
    debug_assert!(
        state.true_count < TRUE_COUNT_SIZE,
        "true count index {} out of range",
        state.true_count
    );
    debug_assert!(
        state.usable_ace < ACE_SIZE,
        "usable ace index {} out of range",
        state.usable_ace
    );
    let mut offset = state.dealer;
    offset = offset * PLAYER_SIZE + state.player;
    offset = offset * TRUE_COUNT_SIZE + state.true_count;
    offset = offset * ACE_SIZE + state.usable_ace;
    offset * ACTION_SIZE + action.index()
}
