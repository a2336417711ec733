use anyhow::Result;
use clap::Args;
use std::time::Instant;

use crate::config::Settings;
use crate::utils::{field, format_bytes, spinner, success};

/// Build the cache (and optionally the dataset) for the epoch of a height
#[derive(Args, Debug)]
pub struct WarmArgs {
    /// Block height whose epoch to build
    #[arg(long)]
    height: u32,

    /// Also build the full dataset
    #[arg(long)]
    dataset: bool,
}

pub fn execute(args: WarmArgs, settings: &Settings) -> Result<()> {
    let manager = settings.manager();
    let epoch = manager.epoch_of(args.height);
    let dag = manager.params();

    let what = if args.dataset {
        format!("cache and {} dataset", format_bytes(dag.dataset_size(epoch)))
    } else {
        format!("{} cache", format_bytes(dag.cache_size(epoch)))
    };

    let pb = spinner(format!("Building epoch {epoch} {what}"))?;
    let started = Instant::now();
    manager.prewarm(args.height, args.dataset);
    pb.finish_and_clear();

    success(&format!("Epoch {epoch} ready in {:.2?}", started.elapsed()));
    let stats = manager.stats();
    field("Seed", manager.seed(epoch));
    field("Caches", format!("{:?}", stats.resident_caches));
    field("Datasets", format!("{:?}", stats.resident_datasets));
    Ok(())
}
