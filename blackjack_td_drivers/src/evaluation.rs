use blackjack_td::{BlackjackGame, Outcome, TemporalDifference};
use rand::Rng;

/// Tally of greedy play over a number of rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvaluationSummary {
    pub games: usize,
    /// Includes blackjacks.
    pub wins: usize,
    pub losses: usize,
    pub ties: usize,
    pub blackjacks: usize,
    pub total_reward: f64,
}

impl EvaluationSummary {
    fn record(&mut self, outcome: Outcome, reward: f64) {
        self.games += 1;
        self.total_reward += reward;
        match outcome {
            Outcome::Player => self.wins += 1,
            Outcome::Blackjack => {
                self.wins += 1;
                self.blackjacks += 1;
            }
            Outcome::Dealer => self.losses += 1,
            Outcome::Tie | Outcome::InProgress => self.ties += 1,
        }
    }

    pub fn win_rate(&self) -> f64 {
        self.rate(self.wins)
    }

    pub fn loss_rate(&self) -> f64 {
        self.rate(self.losses)
    }

    pub fn tie_rate(&self) -> f64 {
        self.rate(self.ties)
    }

    pub fn blackjack_rate(&self) -> f64 {
        self.rate(self.blackjacks)
    }

    pub fn average_reward(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_reward / self.games as f64
        }
    }

    fn rate(&self, count: usize) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            count as f64 / self.games as f64
        }
    }
}

/// Plays `number_of_games` rounds with the agent's greedy policy, resetting
/// the shoe to `true_count` before each round.
pub fn evaluate<R: Rng, A: Rng>(
    agent: &TemporalDifference<A>,
    game: &mut BlackjackGame<R>,
    number_of_games: usize,
    true_count: i32,
) -> Result<EvaluationSummary, blackjack_td::Error> {
    let mut summary = EvaluationSummary::default();
    for _ in 0..number_of_games {
        game.reset(true_count)?;
        let mut transition = game.new_round()?;
        let mut round_reward = transition.reward;
        while !transition.outcome.is_resolved() {
            let action = agent.get_best_action(&transition.state);
            transition = game.step(action)?;
            round_reward += transition.reward;
        }
        summary.record(transition.outcome, round_reward);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_td::learning::Hyperparameters;
    use blackjack_td::Rule;

    #[test]
    fn outcomes_add_up() {
        let mut game = BlackjackGame::with_seed(&Rule::default(), 2).unwrap();
        let agent = TemporalDifference::with_seed(Hyperparameters::default(), 2);
        let summary = evaluate(&agent, &mut game, 500, 2).unwrap();
        assert_eq!(summary.games, 500);
        assert_eq!(summary.wins + summary.losses + summary.ties, 500);
        assert!(summary.blackjacks <= summary.wins);
        let rates = summary.win_rate() + summary.loss_rate() + summary.tie_rate();
        assert!((rates - 1.0).abs() < 1e-9);
    }

    #[test]
    fn untrained_agent_always_hits_and_loses_money() {
        // Every state is unvisited, so the agent hits until the round ends.
        let mut game = BlackjackGame::with_seed(&Rule::default(), 6).unwrap();
        let agent = TemporalDifference::with_seed(Hyperparameters::default(), 6);
        let summary = evaluate(&agent, &mut game, 2000, -1).unwrap();
        assert!(summary.average_reward() < 0.0);
        assert!(summary.loss_rate() > summary.win_rate());
    }

    #[test]
    fn records_each_outcome() {
        let mut summary = EvaluationSummary::default();
        summary.record(Outcome::Blackjack, 1.5);
        summary.record(Outcome::Dealer, -1.0);
        summary.record(Outcome::Tie, 0.0);
        summary.record(Outcome::Player, 20.0);
        assert_eq!(summary.wins, 2);
        assert_eq!(summary.blackjacks, 1);
        assert_eq!(summary.losses, 1);
        assert_eq!(summary.ties, 1);
        assert_eq!(summary.average_reward(), 20.5 / 4.0);
        assert_eq!(summary.blackjack_rate(), 0.25);
    }

    #[test]
    fn empty_summary_has_zero_rates() {
        let summary = EvaluationSummary::default();
        assert_eq!(summary.win_rate(), 0.0);
        assert_eq!(summary.average_reward(), 0.0);
    }
}
