use std::path::Path;

use blackjack_td::{BlackjackGame, Rule, TemporalDifference};
use blackjack_td_drivers::evaluation::evaluate;
use blackjack_td_drivers::persistence::save_q_table;
use blackjack_td_drivers::{parse_config_from_file, Config, DriverError};
use clap::Parser;
use log::{error, info};

const DEFAULT_CONFIG_PATH: &str = "~/.blackjack_td.yml";

#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file
    #[arg(short, long, default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,

    /// Overrides the training seed from the config file
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandLineArgs::parse();
    if let Err(err) = run(args) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(mut args: CommandLineArgs) -> Result<(), DriverError> {
    if args.config == DEFAULT_CONFIG_PATH {
        let config_file_path = home::home_dir()
            .map(|home_dir| home_dir.join(".blackjack_td.yml"))
            .filter(|path| path.is_file())
            .ok_or_else(|| DriverError::MissingConfig(String::from(DEFAULT_CONFIG_PATH)))?;
        args.config = config_file_path.to_string_lossy().into_owned();
    }

    let config = parse_config_from_file(&args.config)?;
    let seed = args.seed.or(config.training.seed);
    train_and_evaluate(&config, seed)
}

fn train_and_evaluate(config: &Config, seed: Option<u64>) -> Result<(), DriverError> {
    let rule: Rule = config.rule.clone().try_into()?;
    let policy = config.training.learning_policy()?;
    let params = config.training.hyperparameters();

    let (mut game, mut agent) = match seed {
        Some(seed) => (
            BlackjackGame::with_seed(&rule, seed)?,
            TemporalDifference::with_seed(params, seed.wrapping_add(1)),
        ),
        None => (BlackjackGame::new(&rule)?, TemporalDifference::new(params)),
    };

    agent.train(
        &mut game,
        config.training.episodes,
        policy,
        config.training.fixed_true_count,
    )?;

    for true_count in &config.evaluation.true_counts {
        let summary = evaluate(&agent, &mut game, config.evaluation.games, *true_count)?;
        info!(
            "true count {:>3}: win {:.2}%  loss {:.2}%  tie {:.2}%  blackjack {:.2}%  reward {:.1} (avg {:.4})",
            true_count,
            summary.win_rate() * 100.0,
            summary.loss_rate() * 100.0,
            summary.tie_rate() * 100.0,
            summary.blackjack_rate() * 100.0,
            summary.total_reward,
            summary.average_reward(),
        );
    }

    if let Some(output) = &config.training.output {
        save_q_table(agent.q_table(), Path::new(output))?;
    }
    Ok(())
}
