//! Demo HTTP service served over plaintext and TLS.
//!
//! The interesting part is startup: the process provisions a self-signed
//! certificate bundle on first run (in-process crypto when available, an
//! `openssl` subprocess otherwise) and then binds two listeners, one
//! plaintext and one TLS, serving the same router.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod tls;

pub use config::schema::ServerConfig;
pub use error::{BootstrapError, GenerationError, PersistenceError};
pub use tls::backend::CryptoBackend;
pub use tls::store::CertificateBundle;
