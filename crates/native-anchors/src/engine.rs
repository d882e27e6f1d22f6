//! The discovery engine: Reader → Parser → Filter → Dedup.
//!
//! ```text
//! NotStarted ─▶ Enumerating(0..n) ─▶ Aggregating ─▶ Done
//!      │                                  │
//!      └──────────────▶ FatalFailure ◀────┘
//! ```
//!
//! Phases only move forward; each transition is logged at debug level.

use std::thread;
use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::dedup;
use crate::error::{DiscoveryError, Result, StoreAccessError};
use crate::filter::{TrustFilter, ValidityPolicy};
use crate::parser;
use crate::platform::{select_backends, EnvOverrides, Platform};
use crate::readers::{Backend, RawStoreReader, StoreReadout};
use crate::types::{
    DiscoveryResult, ParsedCertificate, PartialFailure, StoreId, TrustHint,
};

/// Where a discovery pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    NotStarted,
    /// Reading backend `n` (all backends at once when concurrent).
    Enumerating(usize),
    Aggregating,
    Done,
    FatalFailure,
}

struct PhaseTracker {
    phase: Phase,
}

impl PhaseTracker {
    const fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
        }
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(next >= self.phase, "phase went backwards: {:?} -> {next:?}", self.phase);
        debug!(from = ?self.phase, to = ?next, "discovery phase");
        self.phase = next;
    }
}

/// Drives one or more backends and merges what they find.
#[derive(Debug)]
pub struct DiscoveryEngine {
    platform: Platform,
    backends: Vec<Backend>,
    validity: ValidityPolicy,
    concurrent: bool,
}

impl DiscoveryEngine {
    /// An engine for the running platform and process environment.
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        Self::for_platform(Platform::current(), config, &EnvOverrides::from_env())
    }

    /// An engine for an explicit platform and environment.
    pub fn for_platform(platform: Platform, config: &DiscoveryConfig, env: &EnvOverrides) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            platform,
            backends: select_backends(platform, config, env),
            validity: config.validity,
            concurrent: config.concurrent,
        })
    }

    /// An engine over caller-chosen backends. Path and store settings in
    /// `config` are validated but not used for selection.
    pub fn with_backends(backends: Vec<Backend>, config: &DiscoveryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            platform: Platform::current(),
            backends,
            validity: config.validity,
            concurrent: config.concurrent,
        })
    }

    pub const fn platform(&self) -> Platform {
        self.platform
    }

    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    pub const fn validity(&self) -> ValidityPolicy {
        self.validity
    }

    /// Descriptors of every backend, in order.
    pub fn descriptors(&self) -> Vec<String> {
        self.backends.iter().map(RawStoreReader::descriptor).collect()
    }

    /// Run one discovery pass.
    ///
    /// Fails with [`DiscoveryError::NoStoreAvailable`] only when there is no
    /// backend, or when every backend produced no entry and at least one
    /// failure. Everything else is a success, possibly with partial failures.
    pub fn discover(&self) -> Result<DiscoveryResult> {
        let mut tracker = PhaseTracker::new();

        if self.backends.is_empty() {
            tracker.advance(Phase::FatalFailure);
            warn!(platform = %self.platform, "no trust store backend available");
            return Err(DiscoveryError::NoStoreAvailable {
                failures: Vec::new(),
            });
        }

        let readouts = if self.concurrent {
            tracker.advance(Phase::Enumerating(0));
            self.read_concurrently()
        } else {
            self.backends
                .iter()
                .enumerate()
                .map(|(i, backend)| {
                    tracker.advance(Phase::Enumerating(i));
                    read_backend(backend)
                })
                .collect()
        };

        if readouts.iter().all(StoreReadout::is_total_failure) {
            tracker.advance(Phase::FatalFailure);
            let failures: Vec<PartialFailure> =
                readouts.into_iter().flat_map(|r| r.failures).collect();
            warn!(failures = failures.len(), "every trust store failed");
            return Err(DiscoveryError::NoStoreAvailable { failures });
        }

        tracker.advance(Phase::Aggregating);
        let result = self.aggregate(readouts);
        tracker.advance(Phase::Done);

        info!(
            anchors = result.len(),
            partial_failures = result.partial_failures.len(),
            "trust anchor discovery complete"
        );
        Ok(result)
    }

    fn read_concurrently(&self) -> Vec<StoreReadout> {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .backends
                .iter()
                .map(|backend| (backend, scope.spawn(move || read_backend(backend))))
                .collect();

            handles
                .into_iter()
                .map(|(backend, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        warn!(backend = backend.name(), "backend panicked");
                        StoreReadout {
                            entries: Vec::new(),
                            failures: vec![PartialFailure::store(
                                StoreId::new("Backend", backend.name()),
                                StoreAccessError::NativeApi("reader panicked".into()),
                            )],
                        }
                    })
                })
                .collect()
        })
    }

    fn aggregate(&self, readouts: Vec<StoreReadout>) -> DiscoveryResult {
        let filter = TrustFilter::new(self.validity);
        let mut failures = Vec::new();
        let mut candidates: Vec<(ParsedCertificate, StoreId, TrustHint)> = Vec::new();

        for readout in readouts {
            failures.extend(readout.failures);
            for entry in readout.entries {
                let cert = match parser::parse(&entry.bytes) {
                    Ok(cert) => cert,
                    Err(e) => {
                        debug!(store = %entry.source, entry = %entry.label, error = %e, "unparseable entry");
                        failures.push(PartialFailure::entry(entry.source, entry.label, e));
                        continue;
                    }
                };
                // Distrust must reach the merge even though the filter rejects it.
                if entry.trust_hint == TrustHint::ExplicitlyDistrusted
                    || filter.is_anchor(&cert, entry.trust_hint, &entry.source)
                {
                    candidates.push((cert, entry.source, entry.trust_hint));
                }
            }
        }

        let mut result = dedup::merge(candidates);
        result.partial_failures = failures;
        result
    }
}

fn read_backend(backend: &Backend) -> StoreReadout {
    let readout = backend.read_stores();
    debug!(
        backend = backend.name(),
        entries = readout.entries.len(),
        failures = readout.failures.len(),
        "backend finished"
    );
    readout
}
