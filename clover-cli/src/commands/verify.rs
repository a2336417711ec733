use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use clover_consensus::{verify_proof_of_work, VerifyOptions};
use clover_hash::BlockHeader;

use crate::config::Settings;
use crate::utils::{failure, field, read_json, success};

/// Check the proof of work of a JSON header
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Header file
    #[arg(long)]
    header: PathBuf,

    /// Use the full dataset and decide on the Hashimoto result
    #[arg(long)]
    fast: bool,

    /// Do not compare the claimed mix
    #[arg(long)]
    skip_mix: bool,
}

pub fn execute(args: VerifyArgs, settings: &Settings) -> Result<()> {
    let header: BlockHeader = read_json(&args.header)?;
    let options = VerifyOptions {
        fast: args.fast,
        skip_mix_check: args.skip_mix,
    };

    let manager = settings.manager();
    field("Network", settings.network);
    field("Height", header.height);
    field("Bits", format!("{:08x}", header.bits));
    field(
        "Algorithm",
        if settings.consensus.is_memory_hard(header.version) {
            "memory-hard"
        } else {
            "legacy"
        },
    );

    match verify_proof_of_work(&header, &settings.consensus, &manager, options) {
        Ok(()) => {
            success("Proof of work is valid");
            Ok(())
        }
        Err(e) => {
            failure(&format!("Proof of work rejected: {e}"));
            bail!("verification failed")
        }
    }
}
