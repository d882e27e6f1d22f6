#![allow(dead_code)]

use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair};
use std::path::{Path, PathBuf};

use native_anchors::{DiscoveryConfig, RawCertificateEntry, RawStoreReader, StoreId, StoreReadout, TrustHint};

pub struct Cert {
    pub der: Vec<u8>,
    pub pem: String,
    key: KeyPair,
    cert: rcgen::Certificate,
}

fn params(cn: &str, is_ca: IsCa) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    params.is_ca = is_ca;
    params
}

pub fn root(cn: &str) -> Cert {
    let key = KeyPair::generate().unwrap();
    let cert = params(cn, IsCa::Ca(BasicConstraints::Unconstrained))
        .self_signed(&key)
        .unwrap();
    Cert {
        der: cert.der().to_vec(),
        pem: cert.pem(),
        key,
        cert,
    }
}

pub fn leaf(cn: &str, issuer: &Cert) -> Cert {
    let key = KeyPair::generate().unwrap();
    let cert = params(cn, IsCa::NoCa)
        .signed_by(&key, &issuer.cert, &issuer.key)
        .unwrap();
    Cert {
        der: cert.der().to_vec(),
        pem: cert.pem(),
        key,
        cert,
    }
}

pub fn write(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Only the given paths: no platform stores, no environment.
pub fn paths_only<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> DiscoveryConfig {
    paths
        .into_iter()
        .fold(DiscoveryConfig::default().without_defaults().ignore_env(), |c, p| {
            c.with_path(p)
        })
}

/// A reader serving fixed entries from one store.
pub struct StaticStore {
    pub name: &'static str,
    pub entries: Vec<(Vec<u8>, TrustHint)>,
}

impl RawStoreReader for StaticStore {
    fn name(&self) -> &str {
        self.name
    }

    fn read_stores(&self) -> StoreReadout {
        let store = StoreId::new("Test", self.name);
        StoreReadout {
            entries: self
                .entries
                .iter()
                .enumerate()
                .map(|(i, (der, hint))| {
                    RawCertificateEntry::new(der.clone(), store.clone(), *hint, format!("#{i}"))
                })
                .collect(),
            failures: Vec::new(),
        }
    }
}
