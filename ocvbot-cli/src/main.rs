//! ocvbot CLI
//!
//! Usage from workspace root:
//!   cargo run --bin ocvbot -- schedule --config config.yaml         # Show this run's checkpoints
//!   cargo run --bin ocvbot -- schedule --config config.yaml --json  # Same, as JSON
//!   cargo run --bin ocvbot -- idle --client-x 0 --client-y 0        # Keep the client logged in

use crate::utils::init_logging;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ocvbot::{build_schedule, BotConfig, ClientLayout, EnigoInjector, IdleKeeper, Schedule};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

mod utils;

#[derive(Parser)]
#[command(name = "ocvbot")]
#[command(about = "Screen-driven client automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the session schedule for a run starting now and print it
    Schedule(ScheduleArgs),
    /// Keep the client logged in by nudging the camera every few minutes
    Idle(IdleArgs),
}

#[derive(Parser, Debug)]
struct ScheduleArgs {
    /// Path to the YAML configuration file
    #[clap(long, short = 'c', env = "OCVBOT_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Print the schedule as JSON
    #[clap(long)]
    json: bool,

    /// Seed the random source, for reproducible session counts
    #[clap(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct IdleArgs {
    /// Screen x coordinate of the client's top-left corner
    #[clap(long, default_value_t = 0, allow_negative_numbers = true)]
    client_x: i32,

    /// Screen y coordinate of the client's top-left corner
    #[clap(long, default_value_t = 0, allow_negative_numbers = true)]
    client_y: i32,
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn run_schedule(args: ScheduleArgs) -> Result<()> {
    let config = BotConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let session_config = config
        .main
        .session_config()
        .context("Configuration validation failed")?;

    let start = u64::try_from(chrono::Utc::now().timestamp()).context("Clock is before 1970")?;
    let schedule = build_schedule(&session_config, start, &mut rng_from(args.seed))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        print_schedule(&schedule);
    }
    Ok(())
}

fn print_schedule(schedule: &Schedule) {
    for (i, checkpoint) in schedule.checkpoints.iter().enumerate() {
        match checkpoint.local_time() {
            Some(at) => println!("Checkpoint {}: {}", i + 1, at.format("%a %b %e %H:%M:%S %Y")),
            None => println!("Checkpoint {}: {}", i + 1, checkpoint.timestamp),
        }
    }
    println!("Sessions: {}", schedule.session_total);
    println!(
        "Breaks: {}s to {}s",
        schedule.min_break_duration_secs, schedule.max_break_duration_secs
    );
}

async fn run_idle(args: IdleArgs) -> Result<()> {
    let layout = ClientLayout::new(args.client_x, args.client_y);
    let injector = EnigoInjector::new(StdRng::from_entropy())?;
    let keeper = IdleKeeper::new(injector, layout.chat_menu());
    let mut rng = StdRng::from_entropy();

    keeper.focus().context("Failed to focus the client")?;
    tracing::info!("Idling; press Ctrl+C to stop");

    loop {
        let delay = IdleKeeper::<EnigoInjector<StdRng>>::next_delay(&mut rng);
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down idle keeper");
                return Ok(());
            }
            _ = tokio::time::sleep(delay) => {
                keeper.nudge(&mut rng)?;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    match cli.command {
        Commands::Schedule(args) => run_schedule(args),
        Commands::Idle(args) => run_idle(args).await,
    }
}
