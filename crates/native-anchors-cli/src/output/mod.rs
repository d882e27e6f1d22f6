//! Output formatting for different formats.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use native_anchors::{PartialFailure, TrustAnchor};

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable, colored
    #[default]
    Pretty,
    /// JSON output
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Compact view of an anchor for listings.
#[derive(Debug, Clone, Serialize)]
pub struct AnchorSummary {
    pub fingerprint: String,
    pub certificate_sha256: String,
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub self_signed: bool,
    pub stores: Vec<String>,
}

impl From<&TrustAnchor> for AnchorSummary {
    fn from(anchor: &TrustAnchor) -> Self {
        let cert = &anchor.certificate;
        Self {
            fingerprint: cert.fingerprint.to_hex(),
            certificate_sha256: cert.certificate_sha256.to_hex(),
            subject: cert.subject.text.clone(),
            issuer: cert.issuer.text.clone(),
            not_before: cert.not_before,
            not_after: cert.not_after,
            self_signed: cert.is_self_signed,
            stores: anchor.origin_stores.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One line per anchor: status, short fingerprint, name, expiry.
pub fn print_anchor_line(anchor: &TrustAnchor, now: DateTime<Utc>, with_stores: bool) {
    let cert = &anchor.certificate;
    let status = if cert.is_expired_at(now) {
        "EXPIRED".bright_red()
    } else {
        "  VALID".bright_green()
    };

    let name = cert.display_name();
    let name = if name.chars().count() > 50 {
        format!("{}...", name.chars().take(47).collect::<String>())
    } else {
        name.to_string()
    };

    println!(
        "  {} {} {} (expires {})",
        status,
        cert.fingerprint.short().dimmed(),
        name.bright_white(),
        cert.not_after.format("%Y-%m-%d").to_string().dimmed()
    );
    if with_stores {
        for store in &anchor.origin_stores {
            println!("            {} {}", "from".dimmed(), store);
        }
    }
}

/// Partial failures go to stderr so stdout stays machine-readable.
pub fn print_failures(failures: &[PartialFailure]) {
    if failures.is_empty() {
        return;
    }
    eprintln!(
        "{} {} partial failure(s):",
        "!".yellow().bold(),
        failures.len()
    );
    for failure in failures {
        eprintln!("  {} {failure}", "-".yellow());
    }
}
