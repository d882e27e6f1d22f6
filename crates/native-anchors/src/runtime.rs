//! Async wrapper with a deadline, for callers on a tokio runtime.
//!
//! Discovery itself stays blocking and runs on tokio's blocking pool. A
//! timed-out pass is abandoned, not cancelled: its thread finishes in the
//! background and the result is dropped.

use std::time::Duration;
use tracing::warn;

use crate::config::DiscoveryConfig;
use crate::engine::DiscoveryEngine;
use crate::error::{DiscoveryError, Result};
use crate::types::DiscoveryResult;

/// Run [`crate::discover`] on the blocking pool, failing with
/// [`DiscoveryError::Timeout`] after `timeout`.
pub async fn discover_with_timeout(config: DiscoveryConfig, timeout: Duration) -> Result<DiscoveryResult> {
    let engine = DiscoveryEngine::new(&config)?;
    run_with_timeout(engine, timeout).await
}

/// Run an existing engine on the blocking pool with a deadline.
pub async fn run_with_timeout(engine: DiscoveryEngine, timeout: Duration) -> Result<DiscoveryResult> {
    let task = tokio::task::spawn_blocking(move || engine.discover());
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(DiscoveryError::Join(join.to_string())),
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis(), "trust anchor discovery timed out");
            Err(DiscoveryError::Timeout(timeout))
        }
    }
}
