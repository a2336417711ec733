use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use clover_hash::{BlockHeader, HashimotoMode};

use crate::config::Settings;
use crate::utils::{field, read_json};

/// Run Hashimoto on a JSON header
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Header file
    #[arg(long)]
    header: PathBuf,

    /// Read nodes from the full dataset
    #[arg(long)]
    dataset: bool,

    /// Print JSON
    #[arg(long)]
    json: bool,
}

pub fn execute(args: HashArgs, settings: &Settings) -> Result<()> {
    let header: BlockHeader = read_json(&args.header)?;
    let mode = if args.dataset {
        HashimotoMode::Dataset
    } else {
        HashimotoMode::Cache
    };

    let manager = settings.manager();
    let res = manager.hashimoto(&header, mode);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&res)?);
        return Ok(());
    }

    field("Epoch", manager.epoch_of(header.height));
    field("Mix", res.cmix);
    field("Result", res.result);
    field("Legacy", header.pow_hash());
    if header.hash_mix != res.cmix {
        field("Claimed", format!("{} (differs)", header.hash_mix));
    }
    Ok(())
}
