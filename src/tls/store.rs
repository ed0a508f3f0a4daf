//! Idempotent on-disk certificate bundle store.
//!
//! `ensure` is the only entry point: if both PEM files already exist and
//! parse, they are returned untouched (no writes, byte-identical before and
//! after); if neither exists, the supplied generator runs and the result is
//! persisted with atomic create-if-absent semantics. A half-present or
//! unparseable bundle is an explicit error and is never silently
//! overwritten; regenerating over existing key material is an operator
//! decision.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use x509_parser::pem::parse_x509_pem;

use crate::error::{BootstrapError, GenerationError, PersistenceError};
use crate::tls::generate::GeneratedBundle;

/// The persisted key/certificate pair plus what bootstrap needs to log.
#[derive(Debug, Clone)]
pub struct CertificateBundle {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
    /// Validity window parsed from the persisted certificate.
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    /// Whether this call generated the bundle (false: already present).
    pub generated: bool,
}

/// Ensure a valid bundle exists at the given paths.
///
/// The generator is only invoked when neither file exists. If another
/// process wins the first-run race (observed as `AlreadyExists` on the
/// atomic create), this process discards its own material and re-validates
/// the winner's files.
pub fn ensure<F>(
    key_path: &Path,
    cert_path: &Path,
    generate: F,
) -> Result<CertificateBundle, BootstrapError>
where
    F: FnOnce() -> Result<GeneratedBundle, GenerationError>,
{
    match (key_path.exists(), cert_path.exists()) {
        (true, true) => {
            let (not_before, not_after) = validate_bundle(key_path, cert_path)?;
            tracing::info!(
                key = %key_path.display(),
                cert = %cert_path.display(),
                "certificate bundle already present"
            );
            Ok(CertificateBundle {
                key_path: key_path.to_path_buf(),
                cert_path: cert_path.to_path_buf(),
                not_before,
                not_after,
                generated: false,
            })
        }
        (false, false) => {
            let material = generate()?;
            let generated = match persist(key_path, cert_path, &material) {
                Ok(()) => true,
                Err(PersistenceError::Write { path, source })
                    if source.kind() == ErrorKind::AlreadyExists =>
                {
                    tracing::warn!(
                        path = %path,
                        "lost certificate creation race, adopting the other writer's bundle"
                    );
                    false
                }
                Err(e) => return Err(e.into()),
            };
            let (not_before, not_after) = validate_bundle(key_path, cert_path)?;
            if generated {
                tracing::info!(
                    key = %key_path.display(),
                    cert = %cert_path.display(),
                    "certificate bundle generated"
                );
            }
            Ok(CertificateBundle {
                key_path: key_path.to_path_buf(),
                cert_path: cert_path.to_path_buf(),
                not_before,
                not_after,
                generated,
            })
        }
        (true, false) => {
            let err = PersistenceError::PartialBundle {
                present: key_path.display().to_string(),
                missing: cert_path.display().to_string(),
            };
            tracing::error!(error = %err, "certificate bundle check failed");
            Err(err.into())
        }
        (false, true) => {
            let err = PersistenceError::PartialBundle {
                present: cert_path.display().to_string(),
                missing: key_path.display().to_string(),
            };
            tracing::error!(error = %err, "certificate bundle check failed");
            Err(err.into())
        }
    }
}

/// Write both PEM files, failing if either already exists.
fn persist(
    key_path: &Path,
    cert_path: &Path,
    material: &GeneratedBundle,
) -> Result<(), PersistenceError> {
    write_new(key_path, material.key_pem.as_bytes())?;
    write_new(cert_path, material.cert_pem.as_bytes())?;
    Ok(())
}

fn write_new(path: &Path, contents: &[u8]) -> Result<(), PersistenceError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| PersistenceError::Write {
            path: path.display().to_string(),
            source,
        })?;
    file.write_all(contents)
        .and_then(|_| file.sync_all())
        .map_err(|source| PersistenceError::Write {
            path: path.display().to_string(),
            source,
        })
}

/// Parse both files, returning the certificate's validity window.
///
/// Checks: the key is a readable PEM private key, the certificate is a
/// parseable X.509 with `subject == issuer`.
fn validate_bundle(
    key_path: &Path,
    cert_path: &Path,
) -> Result<(OffsetDateTime, OffsetDateTime), PersistenceError> {
    let key_bytes = fs::read(key_path).map_err(|source| PersistenceError::Read {
        path: key_path.display().to_string(),
        source,
    })?;
    let key = rustls_pemfile::private_key(&mut key_bytes.as_slice()).map_err(|e| {
        PersistenceError::Corrupt {
            path: key_path.display().to_string(),
            reason: e.to_string(),
        }
    })?;
    if key.is_none() {
        return Err(PersistenceError::Corrupt {
            path: key_path.display().to_string(),
            reason: "no private key found in file".into(),
        });
    }

    let cert_bytes = fs::read(cert_path).map_err(|source| PersistenceError::Read {
        path: cert_path.display().to_string(),
        source,
    })?;
    let (_, pem) =
        parse_x509_pem(&cert_bytes).map_err(|e| PersistenceError::Corrupt {
            path: cert_path.display().to_string(),
            reason: e.to_string(),
        })?;
    let cert = pem.parse_x509().map_err(|e| PersistenceError::Corrupt {
        path: cert_path.display().to_string(),
        reason: e.to_string(),
    })?;

    if cert.subject() != cert.issuer() {
        return Err(PersistenceError::Corrupt {
            path: cert_path.display().to_string(),
            reason: format!(
                "certificate is not self-signed (subject {}, issuer {})",
                cert.subject(),
                cert.issuer()
            ),
        });
    }

    Ok((
        cert.validity().not_before.to_datetime(),
        cert.validity().not_after.to_datetime(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fast fixture: the store does not care which backend produced the PEM.
    fn fixture() -> Result<GeneratedBundle, GenerationError> {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".into()])
            .map_err(|e| GenerationError::Native(e.to_string()))?;
        Ok(GeneratedBundle {
            key_pem: cert.key_pair.serialize_pem(),
            cert_pem: cert.cert.pem(),
        })
    }

    #[test]
    fn test_ensure_generates_bundle_in_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("server.key");
        let cert = dir.path().join("server.crt");

        let bundle = ensure(&key, &cert, fixture).unwrap();
        assert!(bundle.generated);
        assert!(key.exists() && cert.exists());
        assert!(fs::read_to_string(&key)
            .unwrap()
            .contains("BEGIN PRIVATE KEY"));
        assert!(fs::read_to_string(&cert)
            .unwrap()
            .contains("BEGIN CERTIFICATE"));
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("server.key");
        let cert = dir.path().join("server.crt");

        ensure(&key, &cert, fixture).unwrap();
        let key_before = fs::read(&key).unwrap();
        let cert_before = fs::read(&cert).unwrap();
        let mtime_before = fs::metadata(&cert).unwrap().modified().unwrap();

        // Second call must not write: the generator is not even invoked.
        let bundle = ensure(&key, &cert, || {
            panic!("generator must not run when the bundle exists")
        })
        .unwrap();

        assert!(!bundle.generated);
        assert_eq!(fs::read(&key).unwrap(), key_before);
        assert_eq!(fs::read(&cert).unwrap(), cert_before);
        assert_eq!(fs::metadata(&cert).unwrap().modified().unwrap(), mtime_before);
    }

    #[test]
    fn test_truncated_certificate_is_explicit_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("server.key");
        let cert = dir.path().join("server.crt");

        ensure(&key, &cert, fixture).unwrap();
        fs::write(&cert, b"").unwrap();

        let err = ensure(&key, &cert, fixture).unwrap_err();
        match err {
            BootstrapError::Persistence(PersistenceError::Corrupt { path, .. }) => {
                assert!(path.ends_with("server.crt"));
            }
            other => panic!("expected Corrupt, got {other}"),
        }
        // The valid key was not touched by the failed call.
        assert!(fs::read_to_string(&key)
            .unwrap()
            .contains("BEGIN PRIVATE KEY"));
    }

    #[test]
    fn test_lone_key_file_is_partial_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("server.key");
        let cert = dir.path().join("server.crt");
        fs::write(&key, "leftover").unwrap();

        let err = ensure(&key, &cert, fixture).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Persistence(PersistenceError::PartialBundle { .. })
        ));
    }

    #[test]
    fn test_validity_window_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("server.key");
        let cert = dir.path().join("server.crt");

        let first = ensure(&key, &cert, fixture).unwrap();
        let second = ensure(&key, &cert, fixture).unwrap();
        assert_eq!(first.not_before, second.not_before);
        assert_eq!(first.not_after, second.not_after);
    }
}
