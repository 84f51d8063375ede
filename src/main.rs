mod board;
mod config;
mod constants;
mod engine;
mod fitness;
mod ga;
mod puzzle;
mod sampler;

use std::fs;

use clap::Parser;
use tracing::info;

use crate::config::GaConfig;
use crate::constants::DEFAULT_ENGINE_PATH;
use crate::engine::UciEngine;

#[derive(Parser, Debug)]
#[command(author, version, about = "Evolves mate-in-N chess puzzles with a UCI engine as judge", long_about = None)]
struct Args {
    /// Path to a UCI engine binary.
    #[arg(long, default_value = DEFAULT_ENGINE_PATH)]
    engine: String,

    /// Seed FEN to grow candidates from. A built-in tactical middlegame is
    /// picked at random when omitted.
    #[arg(long)]
    fen: Option<String>,

    /// Named configuration profile to load from profiles/.
    #[arg(long)]
    profile: Option<String>,

    /// Save the effective configuration under this profile name and exit.
    #[arg(long)]
    save_profile: Option<String>,

    /// Write the puzzle JSON to this file instead of stdout.
    #[arg(long)]
    output: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match &args.profile {
        Some(name) => config::load_profile(name)?,
        None => GaConfig::default(),
    };

    if let Some(name) = &args.save_profile {
        config::save_profile(name, &config)?;
        info!(profile = name.as_str(), "configuration profile saved");
        return Ok(());
    }

    let mut engine = UciEngine::spawn(&args.engine, config.engine_depth)?;

    // The engine must be reaped whether or not the run succeeded.
    let result = ga::generate_puzzle(
        &mut engine,
        &config,
        args.fen.as_deref(),
        &mut rand::thread_rng(),
    );
    let closed = engine.close();
    let puzzle = result?;
    closed?;

    info!(verified = puzzle.is_verified(), fitness = puzzle.fitness, "run complete");
    let json = serde_json::to_string_pretty(&puzzle)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &json)?;
            info!(path = path.as_str(), "puzzle written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
