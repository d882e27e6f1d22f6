//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::{Context as _, Result};
use args::{Cli, Commands};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use native_anchors::{DiscoveryConfig, ValidityPolicy};

use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if cli.no_color {
        colored::control::set_override(false);
    }

    let ctx = commands::Context {
        discovery: discovery_config(&cli)?,
        timeout: cli.timeout.map(Duration::from_secs),
        output_format: cli.output.unwrap_or(OutputFormat::Pretty),
    };
    debug!(config = ?ctx.discovery, "discovery configuration");

    match cli.command {
        Commands::List(args) => commands::list::execute(ctx, args).await,
        Commands::Export(args) => commands::export::execute(ctx, args).await,
        Commands::Check(args) => commands::check::execute(ctx, args).await,
    }
}

/// Logs go to stderr; `--log-level` wins over `RUST_LOG`.
fn init_tracing(level: Option<&str>) {
    let filter = level.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        EnvFilter::new,
    );
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Merge the config file (if any) with command-line flags.
fn discovery_config(cli: &Cli) -> Result<DiscoveryConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                warn!(path = %path.display(), "config file not found, using defaults");
            }
            DiscoveryConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => DiscoveryConfig::default(),
    };

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    for path in &cli.paths {
        config = config.with_path(absolute(&cwd, path));
    }
    if cli.no_defaults {
        config = config.without_defaults();
    }
    if cli.no_env {
        config = config.ignore_env();
    }
    if cli.current_only {
        config = config.with_validity(ValidityPolicy::CurrentOnly);
    }
    if cli.concurrent {
        config = config.concurrent(true);
    }
    Ok(config)
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("anchors").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = parse(&["--no-defaults", "--no-env", "--current-only", "--concurrent", "check"]);
        let config = discovery_config(&cli).unwrap();
        assert!(!config.include_defaults);
        assert!(!config.honor_env);
        assert!(config.concurrent);
        assert_eq!(config.validity, ValidityPolicy::CurrentOnly);
    }

    #[test]
    fn relative_paths_are_resolved() {
        let cli = parse(&["-p", "roots.pem", "list"]);
        let config = discovery_config(&cli).unwrap();
        assert!(config.extra_paths[0].is_absolute());
        assert!(config.extra_paths[0].ends_with("roots.pem"));
    }

    #[test]
    fn config_file_is_layered_under_flags() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("anchors.toml");
        std::fs::write(&file, "honor_env = false\nconcurrent = true\n").unwrap();

        let cli = parse(&["-c", file.to_str().unwrap(), "--no-defaults", "list"]);
        let config = discovery_config(&cli).unwrap();
        assert!(!config.honor_env);
        assert!(config.concurrent);
        assert!(!config.include_defaults);
    }
}
