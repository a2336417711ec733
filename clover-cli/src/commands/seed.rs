use anyhow::Result;
use clap::Args;

use crate::config::Settings;

/// Print the seed of an epoch
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Epoch number
    #[arg(short, long, conflicts_with = "height")]
    epoch: Option<u64>,

    /// Resolve the epoch from a block height instead
    #[arg(long)]
    height: Option<u32>,
}

pub fn execute(args: SeedArgs, settings: &Settings) -> Result<()> {
    let epoch = match (args.epoch, args.height) {
        (Some(epoch), _) => epoch,
        (None, Some(height)) => settings.dag.epoch_of(height),
        (None, None) => 0,
    };

    let manager = settings.manager();
    println!("{}", manager.seed(epoch));
    Ok(())
}
