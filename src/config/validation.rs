//! Configuration validation.
//!
//! Semantic checks on top of what serde enforces syntactically. Returns all
//! validation errors, not just the first, so a bad config file can be fixed
//! in one pass.

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic validation failure.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("certificate.bit_length is {0}, minimum is 2048")]
    BitLengthTooSmall(usize),

    #[error("certificate.validity_days must be at least 1")]
    ZeroValidity,

    #[error("certificate.common_name must not be empty")]
    EmptyCommonName,

    #[error("listener ports must be nonzero")]
    ZeroPort,

    #[error("plaintext and TLS listeners share port {0}")]
    PortCollision(u16),

    #[error("tls.{0} must not be empty")]
    EmptyPath(&'static str),
}

/// Validate a configuration. Pure function, run before the config is
/// accepted into the system.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.certificate.bit_length < 2048 {
        errors.push(ValidationError::BitLengthTooSmall(
            config.certificate.bit_length,
        ));
    }
    if config.certificate.validity_days == 0 {
        errors.push(ValidationError::ZeroValidity);
    }
    if config.certificate.common_name.is_empty() {
        errors.push(ValidationError::EmptyCommonName);
    }
    if config.listener.plain_port == 0 || config.listener.tls_port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.listener.plain_port == config.listener.tls_port {
        errors.push(ValidationError::PortCollision(config.listener.plain_port));
    }
    if config.tls.key_path.is_empty() {
        errors.push(ValidationError::EmptyPath("key_path"));
    }
    if config.tls.cert_path.is_empty() {
        errors.push(ValidationError::EmptyPath("cert_path"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServerConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_small_key_rejected() {
        let mut config = ServerConfig::default();
        config.certificate.bit_length = 1024;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::BitLengthTooSmall(1024))));
    }

    #[test]
    fn test_port_collision_rejected() {
        let mut config = ServerConfig::default();
        config.listener.tls_port = config.listener.plain_port;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::PortCollision(4567))));
    }

    #[test]
    fn test_multiple_errors_reported_together() {
        let mut config = ServerConfig::default();
        config.certificate.bit_length = 512;
        config.certificate.validity_days = 0;
        config.tls.cert_path.clear();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
