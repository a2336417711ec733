use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use clover_cli::commands::*;
use clover_cli::config;

/// Cloverhash operator tooling
#[derive(Parser)]
#[command(name = "clover")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose mode (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file path
    #[arg(short, long, global = true, env = "CLOVER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an epoch seed
    Seed(seed::SeedArgs),

    /// Show cache and dataset sizes per epoch
    Sizes(sizes::SizesArgs),

    /// Pre-build an epoch
    Warm(warm::WarmArgs),

    /// Run Hashimoto on a header
    Hash(hash::HashArgs),

    /// Verify a header's proof of work
    Verify(verify::VerifyArgs),

    /// Compute the next target from chain history
    Retarget(retarget::RetargetArgs),

    /// Search for a valid nonce
    Mine(mine::MineArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(cli.verbose > 2)
        .with_writer(std::io::stderr)
        .init();

    let settings = config::load_config(cli.config.as_deref())?.resolve()?;
    tracing::debug!(network = %settings.network, "Loaded settings");

    match cli.command {
        Commands::Seed(args) => seed::execute(args, &settings)?,
        Commands::Sizes(args) => sizes::execute(args, &settings)?,
        Commands::Warm(args) => warm::execute(args, &settings)?,
        Commands::Hash(args) => hash::execute(args, &settings)?,
        Commands::Verify(args) => verify::execute(args, &settings)?,
        Commands::Retarget(args) => retarget::execute(args, &settings)?,
        Commands::Mine(args) => mine::execute(args, &settings)?,
    }

    Ok(())
}
