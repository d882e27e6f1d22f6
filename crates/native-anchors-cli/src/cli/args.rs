//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Inspect the root certificates this machine trusts.
///
/// Reads the operating system's trust stores (or the files named by
/// SSL_CERT_FILE / SSL_CERT_DIR), drops distrusted and non-CA entries, and
/// prints the merged anchor set.
#[derive(Parser, Debug)]
#[command(name = "anchors")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Discovery configuration file (TOML)
    #[arg(short, long, env = "ANCHORS_CONFIG", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extra certificate file or directory to read (repeatable)
    #[arg(short, long = "path", global = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Skip the platform's own trust stores
    #[arg(long, global = true)]
    pub no_defaults: bool,

    /// Ignore SSL_CERT_FILE and SSL_CERT_DIR
    #[arg(long, global = true)]
    pub no_env: bool,

    /// Drop certificates that are expired or not yet valid
    #[arg(long, global = true)]
    pub current_only: bool,

    /// Read all stores in parallel
    #[arg(long, global = true)]
    pub concurrent: bool,

    /// Give up after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Log filter, e.g. `debug` or `native_anchors=trace` (default: RUST_LOG, then warn)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List trust anchors, one per line
    List(ListArgs),

    /// Write the anchor set as a PEM bundle
    Export(ExportArgs),

    /// Summarize stores and report partial failures
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show the stores each anchor came from
    #[arg(long)]
    pub stores: bool,

    /// Only anchors whose subject contains this text (case-insensitive)
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Fail when any store or entry could not be read
    #[arg(long)]
    pub strict: bool,
}
