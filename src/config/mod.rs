//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → passed by value into lifecycle::run
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no process-wide mutable
//!   configuration block
//! - All fields have defaults so the binary runs with no config file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BackendPreference;
pub use schema::CertificateOptions;
pub use schema::ListenerConfig;
pub use schema::ServerConfig;
pub use schema::TlsConfig;
