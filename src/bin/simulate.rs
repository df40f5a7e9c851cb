//! Simulation CLI: run many seeded autoplay sessions back to back and report
//! win rate, profit spread and bust rate.
//!
//! Usage:
//!   cargo run --release --bin simulate -- --sessions 1000 --rounds 50 --cells 0,0 4,4
//!   cargo run --release --bin simulate -- --sessions 200 --profile corner_rush

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mines_game_engine::engine::models::Position;
use mines_game_engine::engine::profiles::{load_default_profiles, load_profiles, RunOverrides};
use mines_game_engine::engine::simulation::run_simulation;

#[derive(Parser)]
#[command(name = "simulate", about = "Batch-simulate autoplay sessions of the mines game")]
struct Cli {
    /// Number of independent sessions
    #[arg(long, default_value = "100")]
    sessions: usize,

    /// Base seed; session i uses seed + i
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Path to mines_profiles.toml
    #[arg(long, env = "MINES_PROFILES")]
    profiles: Option<PathBuf>,

    /// Profile name (from mines_profiles.toml)
    #[arg(long)]
    profile: Option<String>,

    // --- Session ---
    /// Starting balance per session
    #[arg(long)]
    balance: Option<f64>,

    /// Bet per round
    #[arg(long)]
    bet: Option<f64>,

    /// Mines per board (1-20)
    #[arg(long)]
    mines: Option<usize>,

    // --- Script ---
    /// Rounds per session
    #[arg(long)]
    rounds: Option<u32>,

    /// Cells to reveal each round, in order, as "row,col"
    #[arg(long, num_args = 1.., value_name = "ROW,COL")]
    cells: Vec<Position>,

    /// Random reveals appended after the scripted cells
    #[arg(long)]
    random_picks: Option<usize>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let profiles = match &cli.profiles {
        Some(path) => load_profiles(path)?,
        None => load_default_profiles(),
    };
    let overrides = RunOverrides {
        balance: cli.balance,
        bet: cli.bet,
        mines: cli.mines,
        rounds: cli.rounds,
        cells: cli.cells.clone(),
        random_picks: cli.random_picks,
        ..RunOverrides::default()
    };
    let (settings, config) = profiles.resolve(cli.profile.as_deref(), &overrides)?;
    if config.steps.is_empty() {
        return Err("reveal script is empty, pass --cells, --random-picks or --profile".into());
    }

    eprintln!(
        "Simulate: {} sessions x {} rounds, seed={}, balance={}, bet={}, mines={}, steps={}",
        cli.sessions,
        config.rounds,
        cli.seed,
        settings.initial_balance,
        settings.bet,
        settings.mines,
        config.steps.len(),
    );

    let total = cli.sessions;
    let progress_cb = move |done: usize, _total: usize| {
        eprint!("\r  [{}/{}] sessions completed", done, total);
    };

    let result =
        run_simulation(&settings, &config, cli.sessions, cli.seed, Some(&progress_cb)).await;

    eprintln!("\r                                        "); // clear progress line
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.summary());
    }
    Ok(())
}
