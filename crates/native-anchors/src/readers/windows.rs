//! Windows system certificate stores, read through the CryptoAPI.

use std::io;

use tracing::{debug, trace, warn};
use windows_sys::Win32::Security::Cryptography::{
    CERT_SYSTEM_STORE_CURRENT_SERVICE_ID, CERT_SYSTEM_STORE_CURRENT_USER_GROUP_POLICY_ID,
    CERT_SYSTEM_STORE_CURRENT_USER_ID, CERT_SYSTEM_STORE_LOCAL_MACHINE_ENTERPRISE_ID,
    CERT_SYSTEM_STORE_LOCAL_MACHINE_GROUP_POLICY_ID, CERT_SYSTEM_STORE_LOCAL_MACHINE_ID,
};

use super::{RawStoreReader, StoreReadout};
use crate::error::StoreAccessError;
use crate::types::{PartialFailure, RawCertificateEntry, StoreId, TrustHint};

use sys::{SystemStore, Usage};

const PKIX_SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";
const STORE_FAMILY: &str = "Windows";

/// System store locations, including the ones group policy and enterprise
/// management push roots into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    CurrentUser,
    CurrentUserGroupPolicy,
    LocalMachine,
    LocalMachineEnterprise,
    LocalMachineGroupPolicy,
    CurrentService,
}

impl Location {
    const ALL: [Self; 6] = [
        Self::CurrentUser,
        Self::CurrentUserGroupPolicy,
        Self::LocalMachine,
        Self::LocalMachineEnterprise,
        Self::LocalMachineGroupPolicy,
        Self::CurrentService,
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::CurrentUser => "CurrentUser",
            Self::CurrentUserGroupPolicy => "CurrentUserGroupPolicy",
            Self::LocalMachine => "LocalMachine",
            Self::LocalMachineEnterprise => "LocalMachineEnterprise",
            Self::LocalMachineGroupPolicy => "LocalMachineGroupPolicy",
            Self::CurrentService => "CurrentService",
        }
    }

    const fn id(self) -> u32 {
        match self {
            Self::CurrentUser => CERT_SYSTEM_STORE_CURRENT_USER_ID,
            Self::CurrentUserGroupPolicy => CERT_SYSTEM_STORE_CURRENT_USER_GROUP_POLICY_ID,
            Self::LocalMachine => CERT_SYSTEM_STORE_LOCAL_MACHINE_ID,
            Self::LocalMachineEnterprise => CERT_SYSTEM_STORE_LOCAL_MACHINE_ENTERPRISE_ID,
            Self::LocalMachineGroupPolicy => CERT_SYSTEM_STORE_LOCAL_MACHINE_GROUP_POLICY_ID,
            Self::CurrentService => CERT_SYSTEM_STORE_CURRENT_SERVICE_ID,
        }
    }
}

/// Reads `ROOT` (trusted) and `Disallowed` (distrusted) in every system
/// store location, plus any extra named stores.
#[derive(Debug, Clone)]
pub struct WindowsReader {
    include_system: bool,
    extra_stores: Vec<String>,
}

impl WindowsReader {
    pub fn new(extra_stores: Vec<String>) -> Self {
        Self {
            include_system: true,
            extra_stores,
        }
    }

    /// Only the named stores, without `ROOT` and `Disallowed`.
    pub fn only(stores: Vec<String>) -> Self {
        Self {
            include_system: false,
            extra_stores: stores,
        }
    }

    fn stores(&self) -> Vec<(&str, TrustHint)> {
        let mut stores = Vec::new();
        if self.include_system {
            stores.push(("ROOT", TrustHint::ExplicitlyTrusted));
            stores.push(("Disallowed", TrustHint::ExplicitlyDistrusted));
        }
        stores.extend(
            self.extra_stores
                .iter()
                .map(|s| (s.as_str(), TrustHint::ExplicitlyTrusted)),
        );
        stores
    }

    /// Every (location, store) pair a pass opens, in reading order.
    fn targets(&self) -> Vec<(Location, &str, TrustHint, StoreId)> {
        self.stores()
            .into_iter()
            .flat_map(|(name, hint)| {
                Location::ALL.into_iter().map(move |location| {
                    let id = StoreId::new(STORE_FAMILY, format!("{}/{name}", location.label()));
                    (location, name, hint, id)
                })
            })
            .collect()
    }
}

impl RawStoreReader for WindowsReader {
    fn name(&self) -> &str {
        "windows"
    }

    fn descriptor(&self) -> String {
        let names: Vec<&str> = self.stores().iter().map(|(n, _)| *n).collect();
        format!("windows[{}]", names.join(","))
    }

    fn read_stores(&self) -> StoreReadout {
        let mut out = StoreReadout::default();
        for (location, name, hint, store) in self.targets() {
            match SystemStore::open(location.id(), name) {
                Ok(handle) => read_store(&handle, &store, hint, &mut out),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(store = %store, "certificate store not present");
                }
                Err(e) => {
                    warn!(store = %store, error = %e, "failed to open certificate store");
                    out.failures.push(PartialFailure::store(
                        store,
                        StoreAccessError::NativeApi(format!("CertOpenStore: {e}")),
                    ));
                }
            }
        }
        out
    }
}

fn read_store(handle: &SystemStore, store: &StoreId, hint: TrustHint, out: &mut StoreReadout) {
    let mut count = 0usize;
    for (position, cert) in handle.certificates().enumerate() {
        let label = format!("#{position}");
        // Distrust applies regardless of usage restrictions.
        if hint != TrustHint::ExplicitlyDistrusted {
            match &cert.usage {
                Ok(usage) if allows_server_auth(usage) => {}
                Ok(_) => {
                    trace!(store = %store, entry = %label, "not valid for server authentication");
                    continue;
                }
                Err(e) => {
                    out.failures.push(PartialFailure::entry(
                        store.clone(),
                        label,
                        StoreAccessError::NativeApi(format!("CertGetEnhancedKeyUsage: {e}")),
                    ));
                    continue;
                }
            }
        }
        out.entries
            .push(RawCertificateEntry::new(cert.der, store.clone(), hint, label));
        count += 1;
    }
    debug!(store = %store, entries = count, "read certificate store");
}

fn allows_server_auth(usage: &Usage) -> bool {
    match usage {
        Usage::Any => true,
        Usage::Oids(oids) => oids.iter().any(|oid| oid == PKIX_SERVER_AUTH),
    }
}

/// Owned wrappers over the raw store and context handles.
#[allow(unsafe_code)]
mod sys {
    use std::ffi::CStr;
    use std::io;
    use std::ptr;

    use windows_sys::Win32::Foundation::CRYPT_E_NOT_FOUND;
    use windows_sys::Win32::Security::Cryptography::{
        CertCloseStore, CertEnumCertificatesInStore, CertFreeCertificateContext,
        CertGetEnhancedKeyUsage, CertOpenStore, CERT_CONTEXT, CERT_STORE_PROV_SYSTEM_W,
        CERT_STORE_READONLY_FLAG, CERT_SYSTEM_STORE_LOCATION_SHIFT, CTL_USAGE, HCERTSTORE,
    };

    /// Enhanced key usages of a certificate in its store.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Usage {
        Any,
        Oids(Vec<String>),
    }

    pub struct StoreCertificate {
        pub der: Vec<u8>,
        pub usage: io::Result<Usage>,
    }

    /// A read-only system store, closed on drop.
    pub struct SystemStore(HCERTSTORE);

    impl SystemStore {
        pub fn open(location: u32, name: &str) -> io::Result<Self> {
            let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
            let flags = CERT_STORE_READONLY_FLAG | (location << CERT_SYSTEM_STORE_LOCATION_SHIFT);
            // SAFETY: `wide` is a NUL-terminated UTF-16 string that outlives the call.
            let handle =
                unsafe { CertOpenStore(CERT_STORE_PROV_SYSTEM_W, 0, 0, flags, wide.as_ptr().cast()) };
            if handle.is_null() {
                Err(io::Error::last_os_error())
            } else {
                Ok(Self(handle))
            }
        }

        pub const fn certificates(&self) -> Certificates<'_> {
            Certificates {
                store: self,
                current: ptr::null_mut(),
            }
        }
    }

    impl Drop for SystemStore {
        fn drop(&mut self) {
            // SAFETY: the handle came from CertOpenStore and is closed once.
            unsafe {
                CertCloseStore(self.0, 0);
            }
        }
    }

    /// Walks a store; the enumeration context is released on drop.
    pub struct Certificates<'a> {
        store: &'a SystemStore,
        current: *mut CERT_CONTEXT,
    }

    impl Iterator for Certificates<'_> {
        type Item = StoreCertificate;

        fn next(&mut self) -> Option<StoreCertificate> {
            // SAFETY: `current` is null or the context returned by the previous
            // call, which CertEnumCertificatesInStore takes ownership of.
            self.current = unsafe { CertEnumCertificatesInStore(self.store.0, self.current) };
            if self.current.is_null() {
                return None;
            }
            // SAFETY: a non-null context stays valid until the next enumeration.
            unsafe {
                let ctx = &*self.current;
                let der = std::slice::from_raw_parts(ctx.pbCertEncoded, ctx.cbCertEncoded as usize);
                Some(StoreCertificate {
                    der: der.to_vec(),
                    usage: enhanced_key_usage(self.current),
                })
            }
        }
    }

    impl Drop for Certificates<'_> {
        fn drop(&mut self) {
            if !self.current.is_null() {
                // SAFETY: an unfinished enumeration still owns its last context.
                unsafe {
                    CertFreeCertificateContext(self.current);
                }
            }
        }
    }

    /// Combined EKU extension and store property. An empty list with
    /// `CRYPT_E_NOT_FOUND` means every usage is allowed.
    unsafe fn enhanced_key_usage(ctx: *const CERT_CONTEXT) -> io::Result<Usage> {
        let mut size = 0u32;
        if CertGetEnhancedKeyUsage(ctx, 0, ptr::null_mut(), &mut size) == 0 {
            return Err(io::Error::last_os_error());
        }
        // u64 words keep the CTL_USAGE header aligned.
        let mut buf = vec![0u64; (size as usize).div_ceil(8).max(1)];
        let usage = buf.as_mut_ptr().cast::<CTL_USAGE>();
        if CertGetEnhancedKeyUsage(ctx, 0, usage, &mut size) == 0 {
            return Err(io::Error::last_os_error());
        }

        let usage = &*usage;
        if usage.cUsageIdentifier == 0 {
            let err = io::Error::last_os_error();
            return Ok(if err.raw_os_error() == Some(CRYPT_E_NOT_FOUND) {
                Usage::Any
            } else {
                Usage::Oids(Vec::new())
            });
        }

        let oids = (0..usage.cUsageIdentifier as usize)
            .map(|i| {
                let oid = *usage.rgpszUsageIdentifier.add(i);
                CStr::from_ptr(oid.cast()).to_string_lossy().into_owned()
            })
            .collect();
        Ok(Usage::Oids(oids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_stores_come_first() {
        let reader = WindowsReader::new(vec!["CA".into()]);
        let stores = reader.stores();
        assert_eq!(stores[0], ("ROOT", TrustHint::ExplicitlyTrusted));
        assert_eq!(stores[1], ("Disallowed", TrustHint::ExplicitlyDistrusted));
        assert_eq!(stores[2], ("CA", TrustHint::ExplicitlyTrusted));
        assert_eq!(reader.descriptor(), "windows[ROOT,Disallowed,CA]");
    }

    #[test]
    fn every_system_location_is_read() {
        let reader = WindowsReader::new(Vec::new());
        let ids: Vec<String> = reader
            .targets()
            .into_iter()
            .filter(|(_, name, _, _)| *name == "ROOT")
            .map(|(_, _, _, id)| id.to_string())
            .collect();
        assert_eq!(
            ids,
            [
                "Windows:CurrentUser/ROOT",
                "Windows:CurrentUserGroupPolicy/ROOT",
                "Windows:LocalMachine/ROOT",
                "Windows:LocalMachineEnterprise/ROOT",
                "Windows:LocalMachineGroupPolicy/ROOT",
                "Windows:CurrentService/ROOT",
            ]
        );
        assert_eq!(reader.targets().len(), 12);
    }

    #[test]
    fn only_skips_system_stores() {
        let reader = WindowsReader::only(vec!["Corp".into()]);
        assert_eq!(reader.stores(), vec![("Corp", TrustHint::ExplicitlyTrusted)]);
        assert!(reader
            .targets()
            .iter()
            .all(|(_, name, hint, _)| *name == "Corp" && *hint == TrustHint::ExplicitlyTrusted));
    }

    #[test]
    fn server_auth_usage_rules() {
        assert!(allows_server_auth(&Usage::Any));
        assert!(allows_server_auth(&Usage::Oids(vec![PKIX_SERVER_AUTH.into()])));
        assert!(!allows_server_auth(&Usage::Oids(vec!["1.3.6.1.5.5.7.3.4".into()])));
        assert!(!allows_server_auth(&Usage::Oids(Vec::new())));
    }

    #[test]
    #[ignore = "reads the live Windows certificate stores"]
    fn reads_current_user_root() {
        let out = WindowsReader::new(Vec::new()).read_stores();
        assert!(!out.entries.is_empty());
    }
}
