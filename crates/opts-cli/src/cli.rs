//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;

/// Build the compiler options bundle from a properties directory and print it
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "options-bundle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML runtime config; flags override its values
    #[arg(long, value_name = "FILE", env = "OPTIONS_BUNDLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory of `<group>.<env>.properties` files
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Environment to load after `defaults` (repeatable, applied in order)
    #[arg(short, long = "env", value_name = "ENV")]
    pub envs: Vec<String>,

    /// JSON array of discovered compilers to apply
    #[arg(long, value_name = "FILE")]
    pub compilers: Option<PathBuf>,

    /// Timeout for each remote library request
    #[arg(long, value_name = "SECS")]
    pub remote_timeout: Option<u64>,

    /// Print only the options hash
    #[arg(long)]
    pub hash_only: bool,

    /// Pretty-print the bundle
    #[arg(long, conflicts_with = "hash_only")]
    pub pretty: bool,

    /// Enable verbose output, including configuration warnings
    #[arg(short, long)]
    pub verbose: bool,
}
