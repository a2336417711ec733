use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use clover_consensus::{solve, VerifyOptions};
use clover_hash::BlockHeader;

use crate::config::Settings;
use crate::utils::{read_json, spinner};

/// Search for a nonce that satisfies the header's bits
#[derive(Args, Debug)]
pub struct MineArgs {
    /// Header template file
    #[arg(long)]
    header: PathBuf,

    /// First nonce to try
    #[arg(long, default_value_t = 0)]
    start: u32,

    /// Number of nonces to try
    #[arg(long, default_value_t = 1 << 20)]
    count: u32,

    /// Check candidates against the full dataset
    #[arg(long)]
    fast: bool,
}

pub fn execute(args: MineArgs, settings: &Settings) -> Result<()> {
    let template: BlockHeader = read_json(&args.header)?;
    let manager = settings.manager();
    let options = VerifyOptions {
        fast: args.fast,
        skip_mix_check: false,
    };
    let end = args.start.saturating_add(args.count);

    let pb = spinner(format!("Searching nonces {}..{}", args.start, end))?;
    let solved = solve(&template, &settings.consensus, &manager, options, args.start..end);
    pb.finish_and_clear();

    let header = solved.context("No valid nonce in range")?;
    println!("{}", serde_json::to_string_pretty(&header)?);
    Ok(())
}
