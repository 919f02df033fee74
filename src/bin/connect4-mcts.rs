//! Command-line driver: evaluates one position and reports the root win rate and the
//! recommended move.

use anyhow::{Context, Result, anyhow, ensure};
use clap::{Parser, ValueEnum};
use connect4_mcts::board::Board;
use connect4_mcts::config::{MctsConfig, RewardPolicy, SelectionPerspective};
use connect4_mcts::convergence::{ConvergencePolicy, SearchReport, run_to_convergence};
use connect4_mcts::mcts::{MonteCarloTreeSearch, MoveStatistics};
use connect4_mcts::random::{RandomGenerator, SeededRandomGenerator};
use connect4_mcts::samples;
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "connect4-mcts",
    version,
    about = "Estimate four-in-a-row win chances with Monte Carlo tree search"
)]
struct Cli {
    /// Columns played from the empty board, players alternating (e.g. 3,3,4)
    #[arg(long, value_delimiter = ',', conflicts_with = "sample")]
    moves: Vec<usize>,

    /// Named sample position (empty, endgame, a-to-win, double-threat)
    #[arg(long)]
    sample: Option<String>,

    /// Seed for reproducible rollouts; unseeded when omitted
    #[arg(long, env = "C4_SEED")]
    seed: Option<u64>,

    /// Exploration constant C in UCB1
    #[arg(long, default_value_t = std::f64::consts::SQRT_2)]
    exploration: f64,

    /// Reward credited to player A for a drawn rollout
    #[arg(long, default_value_t = 0.0)]
    draw_reward: f64,

    /// Whose win rate selection maximizes
    #[arg(long, value_enum, default_value_t = Perspective::PlayerA)]
    selection: Perspective,

    /// Stop when consecutive root win rates differ by less than this
    #[arg(long, default_value_t = 1e-5)]
    threshold: f64,

    #[arg(long, default_value_t = 100)]
    min_rounds: u32,

    #[arg(long, env = "C4_MAX_ROUNDS", default_value_t = 200_000)]
    max_rounds: u32,

    /// Print the search tree down to this depth
    #[arg(long)]
    dump_depth: Option<usize>,

    /// Print a JSON summary instead of text
    #[arg(long)]
    json: bool,

    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "C4_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Perspective {
    PlayerA,
    ToMove,
}

impl From<Perspective> for SelectionPerspective {
    fn from(perspective: Perspective) -> Self {
        match perspective {
            Perspective::PlayerA => SelectionPerspective::PlayerA,
            Perspective::ToMove => SelectionPerspective::PlayerToMove,
        }
    }
}

impl Cli {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.exploration.is_finite() && self.exploration >= 0.0,
            "exploration must be a non-negative number"
        );
        ensure!(
            self.config().reward.is_valid(),
            "draw-reward must lie in [0, 1]"
        );
        ensure!(self.threshold >= 0.0, "threshold cannot be negative");
        ensure!(
            self.min_rounds <= self.max_rounds,
            "min-rounds cannot exceed max-rounds"
        );
        Ok(())
    }

    fn board(&self) -> Result<Board> {
        if let Some(name) = &self.sample {
            return samples::by_name(name)
                .ok_or_else(|| {
                    anyhow!(
                        "unknown sample {name:?}, expected one of {}",
                        samples::NAMES.join(", ")
                    )
                })?
                .with_context(|| format!("sample {name:?} is not a valid board"));
        }
        Board::from_moves(&self.moves)
            .with_context(|| format!("cannot replay moves {:?}", self.moves))
    }

    fn config(&self) -> MctsConfig {
        MctsConfig {
            exploration_constant: self.exploration,
            reward: RewardPolicy {
                draw: self.draw_reward,
                ..RewardPolicy::default()
            },
            selection: self.selection.into(),
        }
    }

    fn policy(&self) -> ConvergencePolicy {
        ConvergencePolicy {
            threshold: self.threshold,
            min_rounds: self.min_rounds,
            max_rounds: self.max_rounds,
        }
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    board: Vec<String>,
    config: &'a MctsConfig,
    report: &'a SearchReport,
    moves: Vec<MoveStatistics>,
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|err| anyhow!("failed to initialise tracing: {err}"))
}

fn evaluate<K: RandomGenerator>(
    mut mcts: MonteCarloTreeSearch<K>,
    board: &Board,
    cli: &Cli,
) -> Result<()> {
    let report = run_to_convergence(&mut mcts, &cli.policy());

    if cli.json {
        let summary = Summary {
            board: board.to_lines(),
            config: mcts.config(),
            report: &report,
            moves: mcts.move_statistics(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        if let Some(depth) = cli.dump_depth {
            println!("{}", serde_json::to_string_pretty(&mcts.dump_tree(depth))?);
        }
        return Ok(());
    }

    println!("{board}");
    println!("outcome: {:?}, to move: {:?}", board.evaluate_outcome(), board.to_move());
    for stats in mcts.move_statistics() {
        println!(
            "column {}: {:6.2}% over {} visits",
            stats.column,
            stats.win_rate * 100.0,
            stats.visits
        );
    }
    match report.principal_move {
        Some(column) => println!("principal move: column {column}"),
        None => println!("principal move: none"),
    }
    println!(
        "root win rate for A: {:.4} after {} rounds ({})",
        report.root_win_rate,
        report.rounds,
        if report.converged { "converged" } else { "not converged" }
    );
    if let Some(depth) = cli.dump_depth {
        print!("{}", mcts.dump_tree(depth));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.validate()?;
    init_tracing(&cli.log_level)?;

    let board = cli.board()?;
    info!(seed = ?cli.seed, to_move = ?board.to_move(), "evaluating position");

    let builder = MonteCarloTreeSearch::builder(board.clone()).with_config(cli.config());
    match cli.seed {
        Some(seed) => evaluate(
            builder
                .with_random_generator(SeededRandomGenerator::new(seed))
                .build(),
            &board,
            &cli,
        ),
        None => evaluate(builder.build(), &board, &cli),
    }
}
