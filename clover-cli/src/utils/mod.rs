use anyhow::{Context, Result};
use colored::*;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Parse a JSON file into `T`
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Spinner for long blocking work such as a dataset build
pub fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// Print a `label: value` line
pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<12} {}", format!("{label}:").bright_black(), value);
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message.green());
}

pub fn failure(message: &str) {
    println!("{} {}", "✗".red(), message.red());
}
