use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use clover_consensus::{
    get_next_work_required, select_algorithm, ChainIndex, HistoryBlock, IndexEntry,
    RetargetAlgorithm, Target,
};

use crate::config::Settings;
use crate::utils::{field, read_json};

/// Compute the next compact target from a recorded history
#[derive(Args, Debug)]
pub struct RetargetArgs {
    /// JSON array of `{"time", "bits"}` objects, genesis first
    #[arg(long)]
    history: PathBuf,

    /// Candidate block timestamp; defaults to one spacing after the tip
    #[arg(long)]
    time: Option<i64>,

    /// Print JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RetargetReport {
    pub next_height: u32,
    pub algorithm: RetargetAlgorithm,
    pub bits: String,
    pub target: Target,
}

pub fn next_target(
    history: &[HistoryBlock],
    candidate_time: Option<i64>,
    settings: &Settings,
) -> Result<RetargetReport> {
    let tip = IndexEntry::from_history(history).context("History is empty")?;
    let params = &settings.consensus;
    let time = candidate_time.unwrap_or(tip.time() + params.pow_target_spacing);

    let bits = get_next_work_required(tip.as_ref(), time, params);
    Ok(RetargetReport {
        next_height: tip.height() + 1,
        algorithm: select_algorithm(tip.height() + 1, params),
        bits: format!("{bits:08x}"),
        target: Target::decode_compact(bits).target,
    })
}

pub fn execute(args: RetargetArgs, settings: &Settings) -> Result<()> {
    let history: Vec<HistoryBlock> = read_json(&args.history)?;
    let report = next_target(&history, args.time, settings)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        field("Height", report.next_height);
        field("Algorithm", format!("{:?}", report.algorithm));
        field("Bits", &report.bits);
        field("Target", &report.target);
    }
    Ok(())
}
