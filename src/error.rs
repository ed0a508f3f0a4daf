//! Error types for certificate bootstrap and server startup.
//!
//! Three layers, matching who can fail:
//! - [`GenerationError`]: no usable crypto backend, or generation itself failed
//! - [`PersistenceError`]: the on-disk bundle could not be written or is unusable
//! - [`BootstrapError`]: anything fatal before the listeners are serving
//!
//! None of these are swallowed into a degraded no-TLS mode; a failure at any
//! layer aborts startup.

use thiserror::Error;

/// Errors from key/certificate generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The in-process crypto primitive is unavailable on this runtime.
    #[error("native crypto backend unavailable on this runtime")]
    NativeUnavailable,

    /// In-process generation failed.
    #[error("native certificate generation failed: {0}")]
    Native(String),

    /// The openssl executable could not be spawned or probed.
    #[error("openssl subprocess unavailable: {0}")]
    SubprocessUnavailable(String),

    /// The openssl subprocess ran and reported failure.
    #[error("openssl exited with status {status}: {stderr}")]
    SubprocessFailed { status: i32, stderr: String },

    /// The openssl subprocess reported success but its output file could not
    /// be read back.
    #[error("openssl output unreadable at {path}: {source}")]
    SubprocessOutputMissing {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Both the native and subprocess backends failed, at probe time or
    /// during generation itself.
    #[error("no usable crypto backend: native and openssl both failed")]
    NoUsableBackend,
}

/// Errors from persisting or re-reading the certificate bundle.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A bundle file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A bundle file could not be read back.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Exactly one of the two bundle files exists. Never resolved by
    /// overwriting; the operator must remove the leftover file.
    #[error("incomplete certificate bundle: {present} exists but {missing} is missing")]
    PartialBundle { present: String, missing: String },

    /// A bundle file exists but does not parse as expected.
    #[error("certificate bundle file {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },
}

/// Fatal startup errors.
///
/// Composes the generation and persistence taxonomies with listener-level
/// failures; reaching `main` with any of these terminates the process.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The bundle handed to the server is missing or unusable.
    #[error("certificate bundle unusable: {0}")]
    BundleUnusable(String),

    /// A listener failed to bind or terminated with an error.
    #[error("listener failure on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The TLS stack rejected the certificate/key material.
    #[error("TLS configuration rejected: {0}")]
    Tls(#[source] std::io::Error),
}
