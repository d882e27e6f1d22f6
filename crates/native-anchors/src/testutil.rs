//! Certificate fixtures for unit tests, generated with `rcgen`.

use rcgen::{
    date_time_ymd, BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa,
    KeyPair, KeyUsagePurpose,
};

use crate::parser;
use crate::types::ParsedCertificate;

pub struct Fixture {
    pub der: Vec<u8>,
    pub pem: String,
    params: CertificateParams,
    key: KeyPair,
    cert: rcgen::Certificate,
}

impl Fixture {
    pub fn parsed(&self) -> ParsedCertificate {
        parser::parse(&self.der).unwrap()
    }
}

fn params(cn: &str, is_ca: IsCa, serial: u64) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    dn.push(DnType::OrganizationName, "native-anchors tests");
    params.distinguished_name = dn;
    params.is_ca = is_ca;
    params.serial_number = Some(serial.into());
    if matches!(params.is_ca, IsCa::Ca(_)) {
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    }
    params
}

fn self_signed(params: CertificateParams, key: KeyPair) -> Fixture {
    let cert = params.clone().self_signed(&key).unwrap();
    Fixture {
        der: cert.der().to_vec(),
        pem: cert.pem(),
        params,
        key,
        cert,
    }
}

fn signed(params: CertificateParams, issuer: &Fixture) -> Fixture {
    let key = KeyPair::generate().unwrap();
    let cert = params
        .clone()
        .signed_by(&key, &issuer.cert, &issuer.key)
        .unwrap();
    Fixture {
        der: cert.der().to_vec(),
        pem: cert.pem(),
        params,
        key,
        cert,
    }
}

/// A self-signed CA.
pub fn root(cn: &str) -> Fixture {
    let params = params(cn, IsCa::Ca(BasicConstraints::Unconstrained), 1);
    self_signed(params, KeyPair::generate().unwrap())
}

/// A self-signed CA whose validity ended in 2001.
pub fn expired_root(cn: &str) -> Fixture {
    let mut params = params(cn, IsCa::Ca(BasicConstraints::Unconstrained), 2);
    params.not_before = date_time_ymd(2000, 1, 1);
    params.not_after = date_time_ymd(2001, 1, 1);
    self_signed(params, KeyPair::generate().unwrap())
}

/// A self-signed certificate without the CA flag.
pub fn self_signed_leaf(cn: &str) -> Fixture {
    let params = params(cn, IsCa::NoCa, 3);
    self_signed(params, KeyPair::generate().unwrap())
}

/// A CA certificate issued by `issuer`.
pub fn intermediate(cn: &str, issuer: &Fixture) -> Fixture {
    signed(params(cn, IsCa::Ca(BasicConstraints::Constrained(0)), 4), issuer)
}

/// An end-entity certificate issued by `issuer`.
pub fn leaf(cn: &str, issuer: &Fixture) -> Fixture {
    signed(params(cn, IsCa::NoCa, 5), issuer)
}

/// The same subject and key as `fixture`, signed again with a new serial.
pub fn reissue(fixture: &Fixture, serial: u64) -> Fixture {
    let mut params = fixture.params.clone();
    params.serial_number = Some(serial.into());
    let key = KeyPair::from_pem(&fixture.key.serialize_pem()).unwrap();
    self_signed(params, key)
}
