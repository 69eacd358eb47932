use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::discretizer::{self, discretize};
use super::{ActionValueTable, Hyperparameters};
use crate::{Action, BlackjackGame, Error, LearningPolicy, RoundState, Transition};

/// Tabular TD(λ) control with accumulating eligibility traces over the
/// discretized blackjack state.
#[derive(Debug, Clone)]
pub struct TemporalDifference<R: Rng = StdRng> {
    alpha: f64,
    max_alpha: f64,
    gamma: f64,
    epsilon: f64,
    max_epsilon: f64,
    lambda: f64,
    q_table: ActionValueTable,
    traces: ActionValueTable,
    rng: R,
}

impl TemporalDifference<StdRng> {
    pub fn new(params: Hyperparameters) -> Self {
        Self::with_rng(params, StdRng::from_entropy())
    }

    pub fn with_seed(params: Hyperparameters, seed: u64) -> Self {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TemporalDifference<R> {
    pub fn with_rng(params: Hyperparameters, rng: R) -> Self {
        Self {
            alpha: params.alpha,
            max_alpha: params.alpha,
            gamma: params.gamma,
            epsilon: params.epsilon,
            max_epsilon: params.epsilon,
            lambda: params.lambda,
            q_table: ActionValueTable::zeros(),
            traces: ActionValueTable::zeros(),
            rng,
        }
    }

    /// Epsilon-greedy. Greedy ties go to the lower action index (stand).
    pub fn select_action(&mut self, state: &RoundState) -> Action {
        if self.rng.gen::<f64>() < self.epsilon {
            Action::ALL[self.rng.gen_range(0..Action::ALL.len())]
        } else {
            self.greedy_action(state)
        }
    }

    /// Anneals learning and exploration rates linearly to zero over `max_episodes`.
    pub fn decay(&mut self, episode: usize, max_episodes: usize) {
        let remaining = if max_episodes == 0 {
            0.0
        } else {
            1.0 - episode as f64 / max_episodes as f64
        };
        self.alpha = (self.max_alpha * remaining).max(0.0);
        self.epsilon = (self.max_epsilon * remaining).max(0.0);
    }

    /// Runs `num_episodes` rounds of learning. A non-zero `fixed_true_count`
    /// re-seeds the shoe to that count before every round; rounds that resolve
    /// before the player acts are re-rolled.
    pub fn train<G: Rng>(
        &mut self,
        game: &mut BlackjackGame<G>,
        num_episodes: usize,
        policy: LearningPolicy,
        fixed_true_count: i32,
    ) -> Result<(), Error> {
        info!(
            "training {} episodes ({:?}, true count {})",
            num_episodes, policy, fixed_true_count
        );

        let report_every = (num_episodes / 10).max(1);
        for episode in 0..num_episodes {
            if episode > 0 && episode % report_every == 0 {
                info!(
                    "episode {:>10} / {}  alpha {:.5}  epsilon {:.5}",
                    episode, num_episodes, self.alpha, self.epsilon
                );
            }
            self.decay(episode, num_episodes);
            self.traces.fill(0.0);

            let mut transition = start_round(game, fixed_true_count)?;
            while transition.outcome.is_resolved() {
                transition = start_round(game, fixed_true_count)?;
            }

            let mut state = transition.state;
            let mut action = self.select_action(&state);
            loop {
                let current = discretize(&state);
                let Transition {
                    reward,
                    state: next_state,
                    outcome,
                } = game.step(action)?;

                let mut next_action = None;
                let target = if outcome.is_resolved() {
                    reward
                } else {
                    let next = discretize(&next_state);
                    let bootstrap = match policy {
                        LearningPolicy::OnPolicy => {
                            let chosen = self.select_action(&next_state);
                            next_action = Some(chosen);
                            self.q_table[(next, chosen)]
                        }
                        LearningPolicy::OffPolicy => {
                            let [stand, hit] = self.q_table.action_values(next);
                            stand.max(hit)
                        }
                    };
                    reward + self.gamma * bootstrap
                };

                let delta = target - self.q_table[(current, action)];
                self.traces[(current, action)] += 1.0;
                self.q_table.add_scaled(self.alpha * delta, &self.traces);
                self.traces.scale(self.gamma * self.lambda);

                if outcome.is_resolved() {
                    break;
                }
                state = next_state;
                action = match next_action {
                    Some(chosen) => chosen,
                    None => self.select_action(&state),
                };
            }
        }

        info!("training finished");
        Ok(())
    }

    /// Greedy action for evaluation. Unvisited states default to hit.
    pub fn get_best_action(&self, state: &RoundState) -> Action {
        let values = self.q_table.action_values(discretize(state));
        if values.iter().all(|value| *value == 0.0) {
            Action::Hit
        } else {
            argmax(values)
        }
    }

    pub fn q_value(&self, state: &RoundState, action: Action) -> f64 {
        self.q_table[(discretize(state), action)]
    }

    /// Best action for every dealer value 2-11 (outer) and player total
    /// (inner). Player totals run 4-20, or 12-20 with a usable ace.
    pub fn policy_grid(&self, true_count: i32, usable_ace: bool) -> Vec<Vec<Action>> {
        let lowest_total = if usable_ace { 12 } else { 4 };
        (0..discretizer::DEALER_SIZE as u8)
            .map(|dealer| {
                (lowest_total..=20)
                    .map(|player_total| {
                        self.get_best_action(&RoundState {
                            dealer_value: dealer + 2,
                            player_total,
                            true_count,
                            usable_ace,
                        })
                    })
                    .collect()
            })
            .collect()
    }

    pub fn q_table(&self) -> &ActionValueTable {
        &self.q_table
    }

    /// Replaces the learned values, e.g. with a table loaded from disk.
    pub fn set_q_table(&mut self, q_table: ActionValueTable) {
        self.q_table = q_table;
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn greedy_action(&self, state: &RoundState) -> Action {
        argmax(self.q_table.action_values(discretize(state)))
    }
}

fn start_round<G: Rng>(game: &mut BlackjackGame<G>, fixed_true_count: i32) -> Result<Transition, Error> {
    if fixed_true_count != 0 {
        game.reset(fixed_true_count)?;
    }
    game.new_round()
}

fn argmax(values: [f64; 2]) -> Action {
    if values[Action::Hit.index()] > values[Action::Stand.index()] {
        Action::Hit
    } else {
        Action::Stand
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::StateIndex;
    use crate::simulation::Card;
    use crate::Rule;
    use rand::rngs::mock::StepRng;

    fn state(dealer_value: u8, player_total: u8, true_count: i32, usable_ace: bool) -> RoundState {
        RoundState {
            dealer_value,
            player_total,
            true_count,
            usable_ace,
        }
    }

    #[test]
    fn decay_is_linear_and_never_negative() {
        let mut agent = TemporalDifference::with_seed(Hyperparameters::default(), 0);
        agent.decay(0, 100);
        assert_eq!(agent.alpha(), 0.1);
        agent.decay(50, 100);
        assert!((agent.epsilon() - 0.05).abs() < 1e-12);
        agent.decay(100, 100);
        assert_eq!(agent.alpha(), 0.0);
        agent.decay(150, 100);
        assert_eq!(agent.epsilon(), 0.0);
    }

    #[test]
    fn unvisited_state_defaults_to_hit() {
        let agent = TemporalDifference::with_seed(Hyperparameters::default(), 0);
        assert_eq!(agent.get_best_action(&state(10, 20, 0, false)), Action::Hit);
    }

    #[test]
    fn greedy_ties_prefer_stand() {
        let mut agent = TemporalDifference::with_seed(
            Hyperparameters {
                epsilon: 0.0,
                ..Default::default()
            },
            0,
        );
        let s = state(7, 15, 1, false);
        assert_eq!(agent.select_action(&s), Action::Stand);

        let mut q_table = ActionValueTable::zeros();
        q_table[(discretize(&s), Action::Hit)] = 0.3;
        q_table[(discretize(&s), Action::Stand)] = 0.3;
        agent.set_q_table(q_table);
        assert_eq!(agent.get_best_action(&s), Action::Stand);
        assert_eq!(agent.select_action(&s), Action::Stand);
    }

    #[test]
    fn best_action_is_argmax() {
        let mut agent = TemporalDifference::with_seed(Hyperparameters::default(), 0);
        let s = state(6, 12, -2, true);
        let mut q_table = ActionValueTable::zeros();
        q_table[(discretize(&s), Action::Stand)] = -0.4;
        q_table[(discretize(&s), Action::Hit)] = -0.1;
        agent.set_q_table(q_table);
        assert_eq!(agent.get_best_action(&s), Action::Hit);
        assert_eq!(agent.q_value(&s, Action::Stand), -0.4);
    }

    #[test]
    fn full_exploration_picks_both_actions() {
        let mut agent = TemporalDifference::with_seed(
            Hyperparameters {
                epsilon: 1.0,
                ..Default::default()
            },
            4,
        );
        let s = state(9, 13, 0, false);
        let hits = (0..1000)
            .filter(|_| agent.select_action(&s) == Action::Hit)
            .count();
        assert!(hits > 400 && hits < 600);
    }

    fn scripted_game(cards: &[Card]) -> BlackjackGame {
        let mut game = BlackjackGame::with_seed(&Rule::default(), 21).unwrap();
        game.get_shoe_mut().stack_next(cards).unwrap();
        game
    }

    #[test]
    fn terminal_step_moves_toward_the_reward() {
        // Player 20 against a dealer 10 who draws to hard 17.
        let mut game = scripted_game(&[Card::Ten, Card::Ten, Card::Ten, Card::Seven]);
        let mut agent = TemporalDifference::with_seed(
            Hyperparameters {
                alpha: 0.5,
                epsilon: 0.0,
                ..Default::default()
            },
            21,
        );
        agent
            .train(&mut game, 1, LearningPolicy::OnPolicy, 0)
            .unwrap();

        // Three high cards out of 309 remaining give a true count of -1.
        let decision = state(10, 20, -1, false);
        assert_eq!(game.get_outcome(), crate::Outcome::Player);
        assert_eq!(agent.q_value(&decision, Action::Stand), 0.5);
        assert_eq!(agent.q_value(&decision, Action::Hit), 0.0);
    }

    #[test]
    fn traces_carry_credit_back_to_earlier_steps() {
        // Player 9 hits a ten, stands on 19; dealer 10 draws to hard 17.
        let mut game =
            scripted_game(&[Card::Five, Card::Ten, Card::Four, Card::Ten, Card::Seven]);
        let mut agent = TemporalDifference::with_seed(
            Hyperparameters {
                alpha: 0.5,
                epsilon: 0.0,
                ..Default::default()
            },
            21,
        );
        let first = state(10, 9, 0, false);
        let second = state(10, 19, 0, false);
        let mut q_table = ActionValueTable::zeros();
        q_table[(discretize(&first), Action::Hit)] = 0.2;
        agent.set_q_table(q_table);

        agent
            .train(&mut game, 1, LearningPolicy::OnPolicy, 0)
            .unwrap();

        // Step 1: target 0.9 * Q(second, stand) = 0, so Q(first, hit) drops to 0.1.
        // Step 2: reward 1 reaches Q(second, stand) fully and Q(first, hit)
        // through a trace of 0.81.
        assert_eq!(game.get_player_hand().len(), 3);
        assert!((agent.q_value(&second, Action::Stand) - 0.5).abs() < 1e-12);
        assert!((agent.q_value(&first, Action::Hit) - 0.505).abs() < 1e-12);
    }

    // Draws 0.875 (greedy), then 0.0 (explore) followed by an index of 0
    // (stand), and only then anything else.
    fn hit_then_explore_stand() -> StepRng {
        StepRng::new(0xE000_0000_0000_0000, 0x2000_0000_0000_0000)
    }

    fn train_one_scripted_episode(
        policy: LearningPolicy,
    ) -> (BlackjackGame, TemporalDifference<StepRng>) {
        // Player 9 hits a ten to 19; dealer 10 draws to hard 17.
        let mut game =
            scripted_game(&[Card::Five, Card::Ten, Card::Four, Card::Ten, Card::Seven]);
        let mut agent = TemporalDifference::with_rng(
            Hyperparameters {
                alpha: 0.5,
                epsilon: 0.5,
                ..Default::default()
            },
            hit_then_explore_stand(),
        );
        let mut q_table = ActionValueTable::zeros();
        q_table[(discretize(&state(10, 9, 0, false)), Action::Hit)] = 0.2;
        q_table[(discretize(&state(10, 19, 0, false)), Action::Hit)] = 0.6;
        q_table[(discretize(&state(10, 19, 0, false)), Action::Stand)] = 0.1;
        agent.set_q_table(q_table);

        agent.train(&mut game, 1, policy, 0).unwrap();
        (game, agent)
    }

    #[test]
    fn off_policy_bootstraps_from_the_best_next_action() {
        let (game, agent) = train_one_scripted_episode(LearningPolicy::OffPolicy);
        let first = state(10, 9, 0, false);
        let second = state(10, 19, 0, false);

        // Step 1: target 0.9 * max(0.6, 0.1) = 0.54, Q(first, hit) = 0.2 + 0.5 * 0.34.
        // Step 2: the explored stand wins 1, delta 0.9, trace on step 1 is 0.81.
        assert_eq!(game.get_player_hand().len(), 3);
        assert_eq!(game.get_outcome(), crate::Outcome::Player);
        assert!((agent.q_value(&first, Action::Hit) - 0.7345).abs() < 1e-12);
        assert!((agent.q_value(&second, Action::Stand) - 0.55).abs() < 1e-12);
        assert_eq!(agent.q_value(&second, Action::Hit), 0.6);
    }

    #[test]
    fn on_policy_bootstraps_from_the_action_it_then_takes() {
        let (game, agent) = train_one_scripted_episode(LearningPolicy::OnPolicy);
        let first = state(10, 9, 0, false);
        let second = state(10, 19, 0, false);

        // Step 1: the explored stand gives target 0.9 * 0.1 = 0.09, so
        // Q(first, hit) = 0.2 - 0.5 * 0.11. That stand is the second action.
        assert_eq!(game.get_player_hand().len(), 3);
        assert_eq!(game.get_outcome(), crate::Outcome::Player);
        assert!((agent.q_value(&first, Action::Hit) - 0.5095).abs() < 1e-12);
        assert!((agent.q_value(&second, Action::Stand) - 0.55).abs() < 1e-12);
        assert_eq!(agent.q_value(&second, Action::Hit), 0.6);
    }

    #[test]
    fn training_keeps_values_finite() {
        let mut game = BlackjackGame::with_seed(&Rule::default(), 5).unwrap();
        let mut agent = TemporalDifference::with_seed(Hyperparameters::default(), 5);
        agent
            .train(&mut game, 300, LearningPolicy::OffPolicy, 0)
            .unwrap();

        assert!(agent.q_table().as_slice().iter().any(|v| *v != 0.0));
        assert!(agent.q_table().as_slice().iter().all(|v| v.is_finite()));
        assert!((agent.alpha() - 0.1 / 300.0).abs() < 1e-12);
    }

    #[test]
    fn training_at_fixed_true_count_learns_that_bucket() {
        let mut game = BlackjackGame::with_seed(&Rule::default(), 17).unwrap();
        let mut agent = TemporalDifference::with_seed(Hyperparameters::default(), 17);
        agent
            .train(&mut game, 300, LearningPolicy::OnPolicy, 3)
            .unwrap();

        let bucket = discretizer::true_count_index(3);
        let mut touched = 0;
        for dealer in 0..discretizer::DEALER_SIZE {
            for player in 0..discretizer::PLAYER_SIZE {
                for usable_ace in 0..discretizer::ACE_SIZE {
                    let index = StateIndex {
                        dealer,
                        player,
                        true_count: bucket,
                        usable_ace,
                    };
                    if agent.q_table().action_values(index) != [0.0, 0.0] {
                        touched += 1;
                    }
                }
            }
        }
        assert!(touched > 10);
    }

    #[test]
    fn policy_grid_shape() {
        let agent = TemporalDifference::with_seed(Hyperparameters::default(), 0);
        let grid = agent.policy_grid(0, false);
        assert_eq!(grid.len(), 10);
        assert!(grid.iter().all(|column| column.len() == 17));
        let grid = agent.policy_grid(2, true);
        assert!(grid.iter().all(|column| column.len() == 9));
    }

    #[test]
    fn learns_to_stand_on_hard_20_against_ten() {
        let target = state(10, 20, 0, false);
        let mut stands = 0;
        for seed in 0..3 {
            let mut game = BlackjackGame::with_seed(&Rule::default(), seed).unwrap();
            let mut agent = TemporalDifference::with_seed(Hyperparameters::default(), seed);
            agent
                .train(&mut game, 20_000, LearningPolicy::OffPolicy, 0)
                .unwrap();
            if agent.get_best_action(&target) == Action::Stand {
                stands += 1;
            }
        }
        assert!(stands >= 2);
    }
}
