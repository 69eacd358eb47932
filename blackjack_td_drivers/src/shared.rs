pub mod evaluation;
pub mod persistence;

use blackjack_td::learning::Hyperparameters;
use blackjack_td::{LearningPolicy, Rule};
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config error: {0}")]
    EnumString(#[from] serde::de::value::Error),

    #[error(transparent)]
    Game(#[from] blackjack_td::Error),

    #[error("invalid q-table file: {0}")]
    InvalidTableFile(String),

    #[error("config file {0} not found")]
    MissingConfig(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rule: ConfigRule,
    pub training: ConfigTraining,
    pub evaluation: ConfigEvaluation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRule {
    pub number_of_decks: u8,
    pub reshuffle_proportion: f64,
    pub bet_threshold: i32,
    pub small_bet: u32,
    pub large_bet: u32,
    pub payout_blackjack: f64,
}

impl TryFrom<ConfigRule> for Rule {
    type Error = DriverError;

    fn try_from(config: ConfigRule) -> Result<Rule, Self::Error> {
        let rule = Rule {
            number_of_decks: config.number_of_decks,
            reshuffle_proportion: config.reshuffle_proportion,
            bet_threshold: config.bet_threshold,
            small_bet: config.small_bet,
            large_bet: config.large_bet,
            payout_blackjack: config.payout_blackjack,
        };
        rule.validate()?;
        Ok(rule)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigTraining {
    pub episodes: usize,
    /// "OnPolicy" or "OffPolicy".
    pub policy: String,
    /// 0 trains on a naturally depleting shoe.
    #[serde(default)]
    pub fixed_true_count: i32,
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub lambda: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Where to write the learned Q-table, if anywhere.
    #[serde(default)]
    pub output: Option<String>,
}

impl ConfigTraining {
    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            alpha: self.alpha,
            gamma: self.gamma,
            epsilon: self.epsilon,
            lambda: self.lambda,
        }
    }

    pub fn learning_policy(&self) -> Result<LearningPolicy, serde::de::value::Error> {
        self.policy.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEvaluation {
    pub games: usize,
    pub true_counts: Vec<i32>,
}

/// Reads the content of a given config file and parses it to a Config.
pub fn parse_config_from_file(filename: &str) -> Result<Config, DriverError> {
    let file_content = fs::read_to_string(filename).map_err(|source| DriverError::Io {
        operation: "read",
        path: filename.to_string(),
        source,
    })?;
    Ok(serde_yaml::from_str(&file_content)?)
}
