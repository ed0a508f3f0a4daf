//! Crypto backend selection.
//!
//! Some runtimes cannot perform asymmetric key generation in-process (no
//! usable RNG, stripped-down crypto providers), so generation can fall back
//! to the system `openssl` executable. The choice is made once at startup by
//! capability probing and stays fixed for the process lifetime; there are no
//! scattered runtime checks elsewhere. Because the probe is a cheap keygen
//! and not the full generation path, a native failure during actual
//! generation still gets one subprocess attempt under `Auto` before the
//! process gives up.

use std::fs;
use std::process::Command;

use crate::config::{BackendPreference, CertificateOptions};
use crate::error::GenerationError;
use crate::tls::generate::{self, GeneratedBundle};

/// The concrete crypto implementation used for certificate generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoBackend {
    /// In-process generation (rsa + rcgen).
    Native,
    /// Shell out to the system openssl executable.
    OpensslProcess,
}

impl std::fmt::Display for CryptoBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptoBackend::Native => write!(f, "native"),
            CryptoBackend::OpensslProcess => write!(f, "openssl-process"),
        }
    }
}

/// Choose a crypto backend, evaluated once at startup.
///
/// `Auto` probes the native primitive first and falls back to openssl; an
/// explicitly requested backend that fails its probe is an error rather than
/// a silent substitution.
pub fn choose(preference: BackendPreference) -> Result<CryptoBackend, GenerationError> {
    choose_from(preference, native_available(), openssl_available())
}

/// Selection logic with the probe results passed in.
fn choose_from(
    preference: BackendPreference,
    native_ok: bool,
    openssl_ok: bool,
) -> Result<CryptoBackend, GenerationError> {
    match preference {
        BackendPreference::Auto => {
            if native_ok {
                Ok(CryptoBackend::Native)
            } else if openssl_ok {
                tracing::warn!("native crypto probe failed, falling back to openssl subprocess");
                Ok(CryptoBackend::OpensslProcess)
            } else {
                Err(GenerationError::NoUsableBackend)
            }
        }
        BackendPreference::Native => {
            if native_ok {
                Ok(CryptoBackend::Native)
            } else {
                Err(GenerationError::NativeUnavailable)
            }
        }
        BackendPreference::Openssl => {
            if openssl_ok {
                Ok(CryptoBackend::OpensslProcess)
            } else {
                Err(GenerationError::SubprocessUnavailable(
                    "`openssl version` probe failed".into(),
                ))
            }
        }
    }
}

/// Probe the in-process primitive with a throwaway keygen.
fn native_available() -> bool {
    rcgen::KeyPair::generate().is_ok()
}

/// Probe for a working openssl executable.
fn openssl_available() -> bool {
    Command::new("openssl")
        .arg("version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Generate bundle material with the chosen backend.
///
/// Under `Auto` preference, a native generation failure gets exactly one
/// subprocess fallback attempt; if both backends fail the result is
/// [`GenerationError::NoUsableBackend`]. An explicitly requested backend
/// never substitutes the other.
pub fn generate_material(
    backend: CryptoBackend,
    preference: BackendPreference,
    options: &CertificateOptions,
) -> Result<GeneratedBundle, GenerationError> {
    generate_material_with(
        backend,
        preference,
        || generate::generate(options),
        || generate_via_openssl(options),
    )
}

/// Fallback logic with the generators passed in.
fn generate_material_with<N, S>(
    backend: CryptoBackend,
    preference: BackendPreference,
    native: N,
    subprocess: S,
) -> Result<GeneratedBundle, GenerationError>
where
    N: FnOnce() -> Result<GeneratedBundle, GenerationError>,
    S: FnOnce() -> Result<GeneratedBundle, GenerationError>,
{
    match backend {
        CryptoBackend::OpensslProcess => subprocess(),
        CryptoBackend::Native => match native() {
            Ok(bundle) => Ok(bundle),
            Err(native_err) if preference == BackendPreference::Auto => {
                tracing::warn!(
                    error = %native_err,
                    "native generation failed, attempting openssl subprocess fallback"
                );
                subprocess().map_err(|subprocess_err| {
                    tracing::error!(
                        native_error = %native_err,
                        subprocess_error = %subprocess_err,
                        "openssl fallback also failed"
                    );
                    GenerationError::NoUsableBackend
                })
            }
            Err(native_err) => Err(native_err),
        },
    }
}

/// Generate a bundle by shelling out to openssl.
///
/// Equivalent to the native path: RSA key of the configured size, 365-day
/// (by default) self-signed X.509 certificate, SHA-256 signature. The
/// subprocess writes PEM files into a scratch directory; the material is
/// read back so it flows through the same persistence path as the native
/// backend.
pub fn generate_via_openssl(
    options: &CertificateOptions,
) -> Result<GeneratedBundle, GenerationError> {
    let scratch = tempfile::tempdir()
        .map_err(|e| GenerationError::SubprocessUnavailable(format!("scratch dir: {e}")))?;
    let key_path = scratch.path().join("server.key");
    let cert_path = scratch.path().join("server.crt");

    let subject = format!(
        "/C={}/ST={}/L={}/O={}/CN={}",
        options.country,
        options.state_province,
        options.locality,
        options.organization,
        options.common_name
    );

    let output = Command::new("openssl")
        .arg("req")
        .arg("-x509")
        .arg("-newkey")
        .arg(format!("rsa:{}", options.bit_length))
        .arg("-keyout")
        .arg(&key_path)
        .arg("-out")
        .arg(&cert_path)
        .arg("-days")
        .arg(options.validity_days.to_string())
        .arg("-set_serial")
        .arg(options.serial_number.to_string())
        .arg("-nodes")
        .arg("-subj")
        .arg(&subject)
        .output()
        .map_err(|e| GenerationError::SubprocessUnavailable(e.to_string()))?;

    if !output.status.success() {
        return Err(GenerationError::SubprocessFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let key_pem =
        fs::read_to_string(&key_path).map_err(|source| GenerationError::SubprocessOutputMissing {
            path: key_path.display().to_string(),
            source,
        })?;
    let cert_pem =
        fs::read_to_string(&cert_path).map_err(|source| GenerationError::SubprocessOutputMissing {
            path: cert_path.display().to_string(),
            source,
        })?;

    Ok(GeneratedBundle { key_pem, cert_pem })
}
