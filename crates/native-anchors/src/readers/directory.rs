//! Filesystem stores: PEM bundles, single certificate files, and
//! OpenSSL-style hashed certificate directories.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use super::{RawStoreReader, StoreReadout};
use crate::error::{ParseError, StoreAccessError};
use crate::parser::{contains_pem, pem_trust_hint, split_pem_blocks};
use crate::types::{PartialFailure, RawCertificateEntry, StoreId, TrustHint};

/// Well-known bundle files across Linux and BSD distributions.
const KNOWN_BUNDLE_FILES: &[&str] = &[
    // Debian / Ubuntu / Gentoo / Arch
    "/etc/ssl/certs/ca-certificates.crt",
    // Fedora / RHEL 6
    "/etc/pki/tls/certs/ca-bundle.crt",
    // OpenSUSE
    "/etc/ssl/ca-bundle.pem",
    // Alpine / OpenBSD
    "/etc/ssl/cert.pem",
    // CentOS / RHEL 7+
    "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem",
    // Arch p11-kit
    "/etc/ca-certificates/extracted/tls-ca-bundle.pem",
    // FreeBSD
    "/usr/local/share/certs/ca-root-nss.crt",
];

/// Well-known hashed certificate directories.
const KNOWN_CERT_DIRS: &[&str] = &["/etc/ssl/certs"];

/// Bundle names OpenSSL builds look for inside their certificate directory.
const PROBE_BUNDLE_NAMES: &[&str] = &[
    "cert.pem",
    "certs.pem",
    "ca-bundle.pem",
    "cacert.pem",
    "ca-certificates.crt",
    "certs/ca-certificates.crt",
    "certs/ca-root-nss.crt",
    "certs/ca-bundle.crt",
    "CARootCertificates.pem",
    "tls-ca-bundle.pem",
];

const STORE_FAMILY: &str = "Unix";

/// A file or directory to read certificates from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreSource {
    pub path: PathBuf,
    /// A required source that is missing is reported as a failure;
    /// an optional one is skipped quietly.
    pub required: bool,
}

impl StoreSource {
    pub fn optional(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: false,
        }
    }

    pub fn required(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }
}

/// Reads certificates from a list of files and directories.
#[derive(Debug, Clone)]
pub struct DirectoryReader {
    name: String,
    sources: Vec<StoreSource>,
}

impl DirectoryReader {
    pub fn new(name: impl Into<String>, sources: Vec<StoreSource>) -> Self {
        let mut seen = HashSet::new();
        let sources = sources
            .into_iter()
            .filter(|s| seen.insert(s.path.clone()))
            .collect();
        Self {
            name: name.into(),
            sources,
        }
    }

    /// The conventional system locations, all optional.
    ///
    /// OpenSSL's candidate directories (as known to `openssl-probe`) that
    /// exist on this host, followed by the well-known bundle paths.
    pub fn system_defaults() -> Self {
        let mut sources = Vec::new();
        for dir in openssl_probe::candidate_cert_dirs() {
            for bundle in PROBE_BUNDLE_NAMES {
                sources.push(StoreSource::optional(dir.join(bundle)));
            }
            sources.push(StoreSource::optional(dir.join("certs")));
        }
        sources.extend(KNOWN_BUNDLE_FILES.iter().map(|p| StoreSource::optional(*p)));
        sources.extend(KNOWN_CERT_DIRS.iter().map(|p| StoreSource::optional(*p)));
        Self::new("system-directories", sources)
    }

    pub fn sources(&self) -> &[StoreSource] {
        &self.sources
    }

    /// The store identifier reported for a source path.
    pub fn store_id(path: &Path) -> StoreId {
        StoreId::new(STORE_FAMILY, path.display())
    }

    fn read_source(&self, source: &StoreSource, seen: &mut HashSet<PathBuf>, out: &mut StoreReadout) {
        let path = source.path.as_path();
        let store = Self::store_id(path);

        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !source.required => {
                debug!(path = %path.display(), "certificate source not found, skipping");
                return;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "certificate source unreadable");
                out.failures
                    .push(PartialFailure::store(store, StoreAccessError::io(path.display(), &e)));
                return;
            }
        };

        if meta.is_file() {
            read_file(path, &store, seen, out);
        } else if meta.is_dir() {
            scan_directory(path, &store, seen, out);
        } else {
            debug!(path = %path.display(), "certificate source is neither file nor directory");
        }
    }
}

impl RawStoreReader for DirectoryReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> String {
        let paths: Vec<String> = self
            .sources
            .iter()
            .map(|s| format!("{}{}", if s.required { "!" } else { "" }, s.path.display()))
            .collect();
        format!("{}[{}]", self.name, paths.join(","))
    }

    fn read_stores(&self) -> StoreReadout {
        let mut out = StoreReadout::default();
        let mut seen = HashSet::new();
        for source in &self.sources {
            self.read_source(source, &mut seen, &mut out);
        }
        debug!(
            reader = %self.name,
            entries = out.entries.len(),
            failures = out.failures.len(),
            "directory scan complete"
        );
        out
    }
}

fn scan_directory(dir: &Path, store: &StoreId, seen: &mut HashSet<PathBuf>, out: &mut StoreReadout) {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                let at = e
                    .path()
                    .map_or_else(|| dir.display().to_string(), |p| p.display().to_string());
                match e.io_error() {
                    // Dangling hash links are common and harmless.
                    Some(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
                        debug!(path = %at, "dangling link in certificate directory");
                    }
                    Some(io_err) => out.failures.push(PartialFailure::entry(
                        store.clone(),
                        at.clone(),
                        StoreAccessError::io(&at, io_err),
                    )),
                    None => out.failures.push(PartialFailure::entry(
                        store.clone(),
                        at,
                        StoreAccessError::Read(e.to_string()),
                    )),
                }
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_cert_file_name(entry.path()) {
            continue;
        }
        read_file(entry.path(), store, seen, out);
    }
}

fn read_file(path: &Path, store: &StoreId, seen: &mut HashSet<PathBuf>, out: &mut StoreReadout) {
    let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !seen.insert(canonical) {
        trace!(path = %path.display(), "already read in this pass");
        return;
    }

    let label = path.display().to_string();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %label, error = %e, "failed to read certificate file");
            out.failures.push(PartialFailure::entry(
                store.clone(),
                label.clone(),
                StoreAccessError::io(&label, &e),
            ));
            return;
        }
    };

    match split_entries(&bytes, store, &label) {
        Ok(entries) => out.entries.extend(entries),
        Err(reason) => out
            .failures
            .push(PartialFailure::entry(store.clone(), label, reason)),
    }
}

/// Turn file contents into raw entries: one per certificate PEM block, or
/// the whole file as DER when it carries no armor. `TRUSTED CERTIFICATE`
/// blocks keep the trust flags of their aux data.
fn split_entries(
    bytes: &[u8],
    store: &StoreId,
    label: &str,
) -> Result<Vec<RawCertificateEntry>, ParseError> {
    if !contains_pem(bytes) {
        return Ok(vec![RawCertificateEntry::new(
            bytes.to_vec(),
            store.clone(),
            TrustHint::Unspecified,
            label,
        )]);
    }

    let blocks = split_pem_blocks(bytes);
    let entries: Vec<_> = blocks
        .iter()
        .filter(|b| b.is_certificate())
        .enumerate()
        .map(|(i, block)| {
            RawCertificateEntry::new(
                block.bytes.to_vec(),
                store.clone(),
                pem_trust_hint(block.bytes),
                format!("{label}#{}", i + 1),
            )
        })
        .collect();

    if entries.is_empty() {
        return Err(ParseError::UnsupportedEncoding(format!(
            "no certificate PEM block among {} block(s)",
            blocks.len()
        )));
    }
    Ok(entries)
}

/// Certificate files by extension, plus OpenSSL subject-hash links
/// (`1a2b3c4d.0`).
fn is_cert_file_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if matches!(
            ext.to_ascii_lowercase().as_str(),
            "pem" | "crt" | "cer" | "der"
        ) {
            return true;
        }
        return stem.len() == 8
            && stem.bytes().all(|b| b.is_ascii_hexdigit())
            && !ext.is_empty()
            && ext.bytes().all(|b| b.is_ascii_digit());
    }
    false
}
