use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use torus_snake::game::GameConfig;
use torus_snake::modes::HumanMode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "torus_snake")]
#[command(version, about = "Wrap-around Snake with levels")]
struct Cli {
    /// TOML file overriding the default game settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for food placement, for reproducible games
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs here (the terminal itself is taken by the game).
    /// Filter with RUST_LOG; defaults to `info`.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = match &cli.config {
        Some(path) => GameConfig::from_toml_file(path)?,
        None => GameConfig::default(),
    };
    tracing::info!(?config, seed = ?cli.seed, "starting");

    let mut human_mode = HumanMode::new(config, cli.seed);
    human_mode.run().await?;

    Ok(())
}
