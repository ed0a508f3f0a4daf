//! In-process key pair and self-signed certificate generation.
//!
//! Produces an RSA private key of the configured size and an X.509
//! certificate whose subject equals its issuer, signed with SHA-256.
//! Purely in-memory; persistence is the store's job.

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SerialNumber, PKCS_RSA_SHA256};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use time::{Duration, OffsetDateTime};

use crate::config::CertificateOptions;
use crate::error::GenerationError;

/// PEM-encoded key and certificate, not yet persisted.
#[derive(Debug)]
pub struct GeneratedBundle {
    pub key_pem: String,
    pub cert_pem: String,
}

/// Generate a key pair and matching self-signed certificate.
///
/// The certificate is valid from now until now + `validity_days`, with the
/// subject DN built from `options` and `subject == issuer`. No filesystem
/// side effects.
pub fn generate(options: &CertificateOptions) -> Result<GeneratedBundle, GenerationError> {
    let mut rng = rand::rngs::OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, options.bit_length)
        .map_err(|e| GenerationError::Native(format!("RSA key generation failed: {e}")))?;
    let key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| GenerationError::Native(format!("PKCS#8 encoding failed: {e}")))?;

    // rcgen signs with the key but cannot generate RSA keys itself, so the
    // key is imported with an explicit SHA-256 signature algorithm.
    let key_pair = KeyPair::from_pem_and_sign_algo(&key_pem, &PKCS_RSA_SHA256)
        .map_err(|e| GenerationError::Native(format!("key import failed: {e}")))?;

    let mut params = CertificateParams::new(vec![options.common_name.clone()])
        .map_err(|e| GenerationError::Native(format!("certificate params rejected: {e}")))?;
    params.distinguished_name = subject_name(options);
    params.serial_number = Some(SerialNumber::from(options.serial_number));

    let now = OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + Duration::days(i64::from(options.validity_days));

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| GenerationError::Native(format!("self-signing failed: {e}")))?;

    Ok(GeneratedBundle {
        key_pem: key_pem.to_string(),
        cert_pem: cert.pem(),
    })
}

fn subject_name(options: &CertificateOptions) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, options.country.as_str());
    dn.push(DnType::StateOrProvinceName, options.state_province.as_str());
    dn.push(DnType::LocalityName, options.locality.as_str());
    dn.push(DnType::OrganizationName, options.organization.as_str());
    dn.push(DnType::CommonName, options.common_name.as_str());
    dn
}

#[cfg(test)]
mod tests {
    use super::*;
    use x509_parser::pem::parse_x509_pem;

    // Owned DER so the parsed certificate does not borrow from a local Pem.
    fn cert_der(pem: &str) -> Vec<u8> {
        let (_, pem) = parse_x509_pem(pem.as_bytes()).expect("valid PEM");
        pem.contents.clone()
    }

    #[test]
    fn test_generated_certificate_is_self_signed() {
        let options = CertificateOptions {
            serial_number: 7,
            common_name: "unit.test".into(),
            ..CertificateOptions::default()
        };
        let bundle = generate(&options).expect("generation succeeds");

        let der = cert_der(&bundle.cert_pem);
        let (_, cert) = x509_parser::parse_x509_certificate(&der).expect("valid X.509");

        assert_eq!(cert.subject(), cert.issuer());
        let subject = cert.subject().to_string();
        assert!(subject.contains("CN=unit.test"), "subject was {subject}");
        assert_eq!(cert.tbs_certificate.serial.to_string(), "7");
    }

    #[test]
    fn test_validity_window_matches_policy() {
        let options = CertificateOptions::default();
        let before = OffsetDateTime::now_utc();
        let bundle = generate(&options).expect("generation succeeds");

        let der = cert_der(&bundle.cert_pem);
        let (_, cert) = x509_parser::parse_x509_certificate(&der).expect("valid X.509");

        let not_before = cert.validity().not_before.to_datetime();
        let not_after = cert.validity().not_after.to_datetime();

        // Window length is policy, within one second for the clock read;
        // the start is only as late as key generation is slow.
        assert!((not_after - not_before - Duration::days(365)).abs() <= Duration::seconds(1));
        assert!((not_before - before).abs() < Duration::minutes(5));
    }

    #[test]
    fn test_key_material_parses_as_pkcs8() {
        let bundle = generate(&CertificateOptions::default()).expect("generation succeeds");
        let (item, _) = rustls_pemfile::read_one_from_slice(bundle.key_pem.as_bytes())
            .expect("readable PEM")
            .expect("contains an item");
        assert!(matches!(item, rustls_pemfile::Item::Pkcs8Key(_)));
    }
}
