pub mod commands;
pub mod config;
pub mod utils;

pub use config::{load_config, CloverConfig, Settings};
