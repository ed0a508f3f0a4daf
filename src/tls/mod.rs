//! Certificate provisioning subsystem.
//!
//! # Data Flow
//! ```text
//! backend.rs (capability probe, once per process)
//!     -> generate.rs (in-process RSA + X.509), CryptoBackend::Native
//!     -> backend.rs (openssl subprocess), CryptoBackend::OpensslProcess
//!     -> store.rs (idempotent persist to PEM files on disk)
//!     -> CertificateBundle (paths + validity window, consumed by lifecycle)
//! ```
//!
//! # Design Decisions
//! - The backend is chosen exactly once at startup and never changes
//! - Generated material is discarded from memory once persisted; only the
//!   on-disk PEM form matters afterwards
//! - Both backends funnel through the same persistence path so the
//!   idempotence and first-run race rules hold regardless of backend

pub mod backend;
pub mod generate;
pub mod store;

use std::path::Path;

use crate::config::{CertificateOptions, TlsConfig};
use crate::error::BootstrapError;
use backend::CryptoBackend;
use store::CertificateBundle;

/// Ensure the on-disk bundle exists, generating it with the chosen backend
/// if absent.
pub fn ensure_bundle(
    tls: &TlsConfig,
    options: &CertificateOptions,
    backend: CryptoBackend,
) -> Result<CertificateBundle, BootstrapError> {
    store::ensure(
        Path::new(&tls.key_path),
        Path::new(&tls.cert_path),
        || backend::generate_material(backend, tls.backend, options),
    )
}
