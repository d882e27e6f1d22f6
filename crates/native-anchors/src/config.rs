//! Caller configuration for a discovery pass.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DiscoveryError, Result};
use crate::filter::ValidityPolicy;

/// What to look at and how to judge it.
///
/// Every field has a default, so an empty TOML file is a valid
/// configuration that discovers the platform stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Additional certificate files or directories, read on every platform.
    /// Each must be absolute; a missing one is reported as a failure.
    pub extra_paths: Vec<PathBuf>,

    /// Additional Windows system store names (e.g. `"CA"`), trusted.
    pub extra_stores: Vec<String>,

    /// Read the platform's own stores (default: true).
    pub include_defaults: bool,

    /// Let `SSL_CERT_FILE` / `SSL_CERT_DIR` replace the platform stores
    /// (default: true).
    pub honor_env: bool,

    /// Whether certificates outside their validity window are kept.
    pub validity: ValidityPolicy,

    /// Run each backend on its own thread.
    pub concurrent: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extra_paths: Vec::new(),
            extra_stores: Vec::new(),
            include_defaults: true,
            honor_env: true,
            validity: ValidityPolicy::default(),
            concurrent: false,
        }
    }
}

impl DiscoveryConfig {
    /// Load config from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_paths.push(path.into());
        self
    }

    #[must_use]
    pub fn with_store(mut self, name: impl Into<String>) -> Self {
        self.extra_stores.push(name.into());
        self
    }

    #[must_use]
    pub const fn without_defaults(mut self) -> Self {
        self.include_defaults = false;
        self
    }

    #[must_use]
    pub const fn ignore_env(mut self) -> Self {
        self.honor_env = false;
        self
    }

    #[must_use]
    pub const fn with_validity(mut self, validity: ValidityPolicy) -> Self {
        self.validity = validity;
        self
    }

    #[must_use]
    pub const fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Reject malformed paths and store names.
    pub fn validate(&self) -> Result<()> {
        for path in &self.extra_paths {
            let text = path.as_os_str();
            if text.is_empty() {
                return Err(DiscoveryError::config("extra path is empty"));
            }
            if text.to_string_lossy().contains('\0') {
                return Err(DiscoveryError::config(format!(
                    "extra path {} contains a NUL byte",
                    path.display()
                )));
            }
            if !path.is_absolute() {
                return Err(DiscoveryError::config(format!(
                    "extra path {} is not absolute",
                    path.display()
                )));
            }
        }

        for name in &self.extra_stores {
            if name.trim().is_empty() {
                return Err(DiscoveryError::config("store name is empty"));
            }
            if name.contains('\0') || name.contains('\\') {
                return Err(DiscoveryError::config(format!(
                    "store name {name:?} contains a NUL byte or backslash"
                )));
            }
        }
        Ok(())
    }
}
