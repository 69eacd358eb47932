pub mod discretizer;
pub mod table;

mod agent;

pub use agent::TemporalDifference;
pub use discretizer::{discretize, StateIndex};
pub use table::ActionValueTable;

/// Learning constants. `alpha` and `epsilon` are the starting values of the
/// linearly decayed learning rate and exploration rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub lambda: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.1,
            lambda: 0.9,
        }
    }
}
