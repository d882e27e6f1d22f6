//! The Android `AndroidCAStore` keystore, read over JNI.
//!
//! The keystore only lists enabled anchors, so every entry is explicitly
//! trusted. Aliases are prefixed `system:` or `user:` and are reported as
//! separate stores.

use jni::errors::Error as JniError;
use jni::objects::{JByteArray, JObject, JString, JValue};
use jni::{JNIEnv, JavaVM};
use tracing::{debug, warn};

use super::{RawStoreReader, StoreReadout};
use crate::error::StoreAccessError;
use crate::types::{PartialFailure, RawCertificateEntry, StoreId, TrustHint};

const STORE_FAMILY: &str = "Android";
const KEYSTORE: &str = "AndroidCAStore";

#[derive(Debug, Clone, Copy, Default)]
pub struct AndroidReader;

impl AndroidReader {
    pub const fn new() -> Self {
        Self
    }
}

impl RawStoreReader for AndroidReader {
    fn name(&self) -> &str {
        "android-keystore"
    }

    fn read_stores(&self) -> StoreReadout {
        let mut out = StoreReadout::default();
        if let Err(e) = read_keystore(&mut out) {
            warn!(error = %e, "failed to read {KEYSTORE}");
            out.failures.push(PartialFailure::store(
                StoreId::new(STORE_FAMILY, KEYSTORE),
                StoreAccessError::NativeApi(e),
            ));
        }
        debug!(entries = out.entries.len(), failures = out.failures.len(), "read android keystore");
        out
    }
}

/// The store an alias belongs to.
fn store_for_alias(alias: &str) -> StoreId {
    match alias.split_once(':') {
        Some(("system", _)) => StoreId::new(STORE_FAMILY, format!("{KEYSTORE}/system")),
        Some(("user", _)) => StoreId::new(STORE_FAMILY, format!("{KEYSTORE}/user")),
        _ => StoreId::new(STORE_FAMILY, KEYSTORE),
    }
}

fn read_keystore(out: &mut StoreReadout) -> Result<(), String> {
    let vm = java_vm()?;
    let mut env = vm
        .attach_current_thread()
        .map_err(|e| format!("attach to JVM: {e}"))?;
    let result = enumerate(&mut env, out).map_err(|e| format!("enumerate {KEYSTORE}: {e}"));
    clear_exception(&mut env);
    result
}

#[allow(unsafe_code)]
fn java_vm() -> Result<JavaVM, String> {
    let ctx = std::panic::catch_unwind(ndk_context::android_context)
        .map_err(|_| "android context not initialised by the host application".to_string())?;
    // SAFETY: ndk-context holds the process-wide JavaVM pointer registered by
    // the host application; it stays valid for the life of the process.
    unsafe { JavaVM::from_raw(ctx.vm().cast()) }.map_err(|e| format!("JavaVM: {e}"))
}

fn clear_exception(env: &mut JNIEnv<'_>) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_clear();
    }
}

fn enumerate(env: &mut JNIEnv<'_>, out: &mut StoreReadout) -> jni::errors::Result<()> {
    let class = env.find_class("java/security/KeyStore")?;
    let name = env.new_string(KEYSTORE)?;
    let keystore = env
        .call_static_method(
            &class,
            "getInstance",
            "(Ljava/lang/String;)Ljava/security/KeyStore;",
            &[JValue::Object(&name)],
        )?
        .l()?;

    let null = JObject::null();
    env.call_method(
        &keystore,
        "load",
        "(Ljava/security/KeyStore$LoadStoreParameter;)V",
        &[JValue::Object(&null)],
    )?
    .v()?;

    let aliases = env
        .call_method(&keystore, "aliases", "()Ljava/util/Enumeration;", &[])?
        .l()?;

    while env
        .call_method(&aliases, "hasMoreElements", "()Z", &[])?
        .z()?
    {
        let alias = JString::from(
            env.call_method(&aliases, "nextElement", "()Ljava/lang/Object;", &[])?
                .l()?,
        );
        let label = String::from(env.get_string(&alias)?);
        let store = store_for_alias(&label);

        match read_alias(env, &keystore, &alias) {
            Ok(der) => out.entries.push(RawCertificateEntry::new(
                der,
                store,
                TrustHint::ExplicitlyTrusted,
                label,
            )),
            Err(e) => {
                clear_exception(env);
                out.failures.push(PartialFailure::entry(
                    store,
                    label,
                    StoreAccessError::NativeApi(e.to_string()),
                ));
            }
        }
        env.delete_local_ref(alias)?;
    }
    Ok(())
}

fn read_alias(
    env: &mut JNIEnv<'_>,
    keystore: &JObject<'_>,
    alias: &JString<'_>,
) -> jni::errors::Result<Vec<u8>> {
    env.with_local_frame(4, |env| -> jni::errors::Result<Vec<u8>> {
        let cert = env
            .call_method(
                keystore,
                "getCertificate",
                "(Ljava/lang/String;)Ljava/security/cert/Certificate;",
                &[JValue::Object(alias)],
            )?
            .l()?;
        if cert.is_null() {
            return Err(JniError::NullPtr("getCertificate"));
        }
        let encoded = JByteArray::from(env.call_method(&cert, "getEncoded", "()[B", &[])?.l()?);
        env.convert_byte_array(&encoded)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_map_to_stores() {
        assert_eq!(
            store_for_alias("system:9d66eef0.0").as_str(),
            "Android:AndroidCAStore/system"
        );
        assert_eq!(
            store_for_alias("user:1a2b3c4d.0").as_str(),
            "Android:AndroidCAStore/user"
        );
        assert_eq!(store_for_alias("other").as_str(), "Android:AndroidCAStore");
    }
}
