use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mines_game_engine::engine::autoplay::{lock_session, shared, AutoPlayController, AutoPlayHooks};
use mines_game_engine::engine::models::Position;
use mines_game_engine::engine::profiles::{load_default_profiles, load_profiles, RunOverrides};

#[derive(Parser)]
#[command(name = "mines", about = "Autoplay a 5x5 mines wagering session")]
struct Cli {
    /// Starting balance
    #[arg(long)]
    balance: Option<f64>,

    /// Bet per round
    #[arg(long)]
    bet: Option<f64>,

    /// Mines per board (1-20)
    #[arg(long)]
    mines: Option<usize>,

    /// Number of rounds to play
    #[arg(long)]
    rounds: Option<u32>,

    /// Cells to reveal each round, in order, as "row,col"
    #[arg(long, num_args = 1.., value_name = "ROW,COL")]
    cells: Vec<Position>,

    /// Random reveals appended after the scripted cells
    #[arg(long)]
    random_picks: Option<usize>,

    /// Delay before the script runs each round (ms)
    #[arg(long)]
    delay_between_rounds: Option<u64>,

    /// Delay after each round settles (ms)
    #[arg(long)]
    delay_after_reveal: Option<u64>,

    /// Seed for reproducible mine layouts
    #[arg(long)]
    seed: Option<u64>,

    /// Profile name (from mines_profiles.toml)
    #[arg(long)]
    profile: Option<String>,

    /// Path to mines_profiles.toml (default: auto-discover)
    #[arg(long, env = "MINES_PROFILES")]
    profiles: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn overrides(&self) -> RunOverrides {
        RunOverrides {
            balance: self.balance,
            bet: self.bet,
            mines: self.mines,
            seed: self.seed,
            rounds: self.rounds,
            cells: self.cells.clone(),
            random_picks: self.random_picks,
            delay_between_rounds_ms: self.delay_between_rounds,
            delay_after_reveal_ms: self.delay_after_reveal,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let profiles = match &cli.profiles {
        Some(path) => load_profiles(path)?,
        None => load_default_profiles(),
    };
    let (settings, config) = profiles.resolve(cli.profile.as_deref(), &cli.overrides())?;

    let session = shared(settings.build_session());
    let controller = AutoPlayController::new(session.clone());

    let stop = controller.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after the current round");
            stop.stop();
        }
    });

    let observer = session.clone();
    let hooks = AutoPlayHooks::new()
        .on_round_start(|round| tracing::debug!(round, "round starting"))
        .on_round_end(move |round, cash_out| {
            let session = lock_session(&observer);
            if let Some(result) = session.history().last() {
                tracing::info!(
                    round,
                    won = result.won,
                    multiplier = result.multiplier,
                    payout = result.payout,
                    cashed_out = cash_out.is_some(),
                    balance = session.balance(),
                    "round settled"
                );
            }
        });

    let Some(report) = controller.start_auto_play(&config, hooks).await else {
        tracing::warn!("reveal script is empty, pass --cells, --random-picks or --profile");
        return Ok(());
    };
    let stats = lock_session(&session).stats();

    if cli.json {
        let out = serde_json::json!({ "report": report, "stats": stats });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Autoplay {} after {} rounds", report.reason, report.rounds_played);
        println!("{}", stats.summary());
    }
    Ok(())
}
