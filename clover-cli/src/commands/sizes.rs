use anyhow::{ensure, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::config::Settings;
use crate::utils::format_bytes;

/// Show cache and dataset sizes for a range of epochs
#[derive(Args, Debug)]
pub struct SizesArgs {
    /// First epoch
    #[arg(long, default_value_t = 0)]
    from: u64,

    /// Last epoch (inclusive)
    #[arg(long, default_value_t = 10)]
    to: u64,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize, Tabled)]
pub struct EpochSizes {
    #[tabled(rename = "Epoch")]
    pub epoch: u64,
    #[tabled(rename = "Cache bytes")]
    pub cache_bytes: u64,
    #[tabled(rename = "Cache items")]
    pub cache_items: u64,
    #[tabled(rename = "Dataset bytes")]
    pub dataset_bytes: u64,
    #[tabled(rename = "Dataset items")]
    pub dataset_items: u64,
    #[tabled(rename = "Dataset")]
    #[serde(skip)]
    pub dataset_human: String,
}

pub fn epoch_sizes(settings: &Settings, from: u64, to: u64) -> Vec<EpochSizes> {
    let dag = &settings.dag;
    (from..=to)
        .map(|epoch| EpochSizes {
            epoch,
            cache_bytes: dag.cache_size(epoch),
            cache_items: dag.cache_items(epoch),
            dataset_bytes: dag.dataset_size(epoch),
            dataset_items: dag.dataset_items(epoch),
            dataset_human: format_bytes(dag.dataset_size(epoch)),
        })
        .collect()
}

pub fn execute(args: SizesArgs, settings: &Settings) -> Result<()> {
    ensure!(args.from <= args.to, "--from must not be after --to");

    let rows = epoch_sizes(settings, args.from, args.to);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", Table::new(&rows).with(Style::rounded()));
    }
    Ok(())
}
