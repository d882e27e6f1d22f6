//! Command implementations.

pub mod check;
pub mod export;
pub mod list;

use std::time::Duration;

use native_anchors::{DiscoveryConfig, DiscoveryResult};

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Settings for the discovery pass
    pub discovery: DiscoveryConfig,

    /// Deadline for the whole pass
    pub timeout: Option<Duration>,

    /// Output format
    pub output_format: OutputFormat,
}

impl Context {
    /// Run one discovery pass, honoring the deadline if one was given.
    pub async fn discover(&self) -> anyhow::Result<DiscoveryResult> {
        let result = match self.timeout {
            Some(timeout) => {
                native_anchors::runtime::discover_with_timeout(self.discovery.clone(), timeout).await?
            }
            None => {
                let config = self.discovery.clone();
                tokio::task::spawn_blocking(move || native_anchors::discover(&config)).await??
            }
        };
        Ok(result)
    }
}
