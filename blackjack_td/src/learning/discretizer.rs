//! Maps a raw `RoundState` to bounded table indices. Out-of-range inputs are
//! clamped to the nearest edge of the table.

use crate::RoundState;

pub const DEALER_SIZE: usize = 10;
pub const PLAYER_SIZE: usize = 17;
pub const TRUE_COUNT_SIZE: usize = 13;
pub const ACE_SIZE: usize = 2;

const LOWEST_DEALER_VALUE: i32 = 2;
const LOWEST_PLAYER_TOTAL: i32 = 4;
const TRUE_COUNT_LIMIT: i32 = 5;

/// Position of a discretized state in the action-value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateIndex {
    pub dealer: usize,
    pub player: usize,
    pub true_count: usize,
    pub usable_ace: usize,
}

/// Dealer value 2-11 to 0-9.
pub fn dealer_index(dealer_value: u8) -> usize {
    clamp_index(dealer_value as i32 - LOWEST_DEALER_VALUE, DEALER_SIZE)
}

/// Player total 4-20 to 0-16.
pub fn player_index(player_total: u8) -> usize {
    clamp_index(player_total as i32 - LOWEST_PLAYER_TOTAL, PLAYER_SIZE)
}

/// True counts below -5 share bucket 0 and above 5 share bucket 12; -5..=5
/// map to 1..=11.
pub fn true_count_index(true_count: i32) -> usize {
    if true_count < -TRUE_COUNT_LIMIT {
        0
    } else if true_count > TRUE_COUNT_LIMIT {
        TRUE_COUNT_SIZE - 1
    } else {
        (true_count + TRUE_COUNT_LIMIT + 1) as usize
    }
}

pub fn usable_ace_index(usable_ace: bool) -> usize {
    usable_ace as usize
}

pub fn discretize(state: &RoundState) -> StateIndex {
    StateIndex {
        dealer: dealer_index(state.dealer_value),
        player: player_index(state.player_total),
        true_count: true_count_index(state.true_count),
        usable_ace: usable_ace_index(state.usable_ace),
    }
}

fn clamp_index(offset: i32, size: usize) -> usize {
    offset.clamp(0, size as i32 - 1) as usize
}
