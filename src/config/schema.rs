//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default matching the historical behavior of the service
//! (ports 4567/4568, `server.key`/`server.crt` in the working directory,
//! 2048-bit key, 365-day self-signed certificate for `localhost`).

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind host, plaintext and TLS ports).
    pub listener: ListenerConfig,

    /// Paths to the persisted certificate bundle and backend preference.
    pub tls: TlsConfig,

    /// Parameters for generated certificates.
    pub certificate: CertificateOptions,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind both listeners to.
    pub bind_host: String,

    /// Plaintext HTTP port.
    pub plain_port: u16,

    /// TLS port.
    pub tls_port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            plain_port: 4567,
            tls_port: 4568,
        }
    }
}

/// Certificate bundle location and crypto backend preference.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to the private key file (PEM).
    pub key_path: String,

    /// Path to the certificate file (PEM).
    pub cert_path: String,

    /// Which crypto backend to use for generation.
    pub backend: BackendPreference,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            key_path: "server.key".to_string(),
            cert_path: "server.crt".to_string(),
            backend: BackendPreference::Auto,
        }
    }
}

/// Crypto backend preference. `Auto` probes native first, then openssl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    #[default]
    Auto,
    Native,
    Openssl,
}

/// Parameters for generated self-signed certificates.
///
/// Serial number and common name are deliberately configurable: the original
/// deployment hard-coded serial 0 and CN=localhost, which is wrong for any
/// multi-host setup, so both are surfaced here with the historical defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CertificateOptions {
    /// RSA key size in bits. Must be at least 2048.
    pub bit_length: usize,

    /// Certificate validity in days from the moment of generation.
    pub validity_days: u32,

    /// Subject common name (CN).
    pub common_name: String,

    /// Subject organization (O).
    pub organization: String,

    /// Subject locality (L).
    pub locality: String,

    /// Subject state or province (ST).
    pub state_province: String,

    /// Subject country (C).
    pub country: String,

    /// Certificate serial number.
    pub serial_number: u64,
}

impl Default for CertificateOptions {
    fn default() -> Self {
        Self {
            bit_length: 2048,
            validity_days: 365,
            common_name: "localhost".to_string(),
            organization: "dualserve".to_string(),
            locality: "Local".to_string(),
            state_province: "Local".to_string(),
            country: "US".to_string(),
            serial_number: 0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is not set.
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "dualserve=debug,tower_http=debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports_and_paths() {
        let config = ServerConfig::default();
        assert_eq!(config.listener.bind_host, "0.0.0.0");
        assert_eq!(config.listener.plain_port, 4567);
        assert_eq!(config.listener.tls_port, 4568);
        assert_eq!(config.tls.key_path, "server.key");
        assert_eq!(config.tls.cert_path, "server.crt");
        assert_eq!(config.tls.backend, BackendPreference::Auto);
    }

    #[test]
    fn test_default_certificate_options() {
        let opts = CertificateOptions::default();
        assert_eq!(opts.bit_length, 2048);
        assert_eq!(opts.validity_days, 365);
        assert_eq!(opts.common_name, "localhost");
        assert_eq!(opts.serial_number, 0);
    }

    #[test]
    fn test_backend_preference_from_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
            [tls]
            backend = "openssl"
            "#,
        )
        .unwrap();
        assert_eq!(config.tls.backend, BackendPreference::Openssl);
    }
}
