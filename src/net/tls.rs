//! Ephemeral TLS identity.
//!
//! A fresh P-384 key pair and self-signed certificate are generated on every
//! start. Nothing is written to disk; clients are expected to skip
//! verification.

use std::time::{SystemTime, UNIX_EPOCH};

use axum_server::tls_rustls::RustlsConfig;
use rcgen::{
    date_time_ymd, CertificateParams, DistinguishedName, DnType, IsCa, KeyIdMethod, KeyPair,
    KeyUsagePurpose, SerialNumber, PKCS_ECDSA_P384_SHA384,
};
use sha1::{Digest, Sha1};

/// Subject common name of the generated certificate.
pub const CERT_COMMON_NAME: &str = "imgproxy";

/// How long the certificate claims to be valid, counted from now.
const VALIDITY_YEARS: i32 = 100;

/// Average Gregorian year in seconds.
const SECS_PER_YEAR: u64 = 31_556_952;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("crypto error: {0}")]
    Crypto(#[from] rcgen::Error),

    #[error("system clock is before the Unix epoch")]
    Clock,

    #[error("tls error: {0}")]
    Tls(#[source] std::io::Error),
}

/// A DER-encoded certificate and its PKCS#8 private key.
pub struct EphemeralIdentity {
    cert_der: Vec<u8>,
    key_der: Vec<u8>,
}

impl EphemeralIdentity {
    /// Generate a new key pair and self-signed certificate.
    pub fn generate() -> Result<Self, IdentityError> {
        let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P384_SHA384)?;
        Self::self_signed(&key_pair)
    }

    fn self_signed(key_pair: &KeyPair) -> Result<Self, IdentityError> {
        let mut params = CertificateParams::default();
        params.serial_number = Some(SerialNumber::from_slice(&[1]));

        let mut subject = DistinguishedName::new();
        subject.push(DnType::CommonName, CERT_COMMON_NAME);
        params.distinguished_name = subject;

        params.not_before = date_time_ymd(1970, 1, 1);
        params.not_after = date_time_ymd(current_year()? + VALIDITY_YEARS, 1, 1);

        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
            KeyUsagePurpose::DataEncipherment,
        ];
        params.is_ca = IsCa::ExplicitNoCa;

        // SHA-1 of the SubjectPublicKeyInfo, 20 bytes.
        let key_id = Sha1::digest(key_pair.public_key_der());
        params.key_identifier_method = KeyIdMethod::PreSpecified(key_id.to_vec());

        let cert = params.self_signed(key_pair)?;

        tracing::debug!(
            common_name = CERT_COMMON_NAME,
            algorithm = "ECDSA P-384",
            "Generated ephemeral TLS identity"
        );

        Ok(Self {
            cert_der: cert.der().to_vec(),
            key_der: key_pair.serialize_der(),
        })
    }

    pub fn certificate_der(&self) -> &[u8] {
        &self.cert_der
    }

    pub fn private_key_der(&self) -> &[u8] {
        &self.key_der
    }

    /// Build the listener TLS configuration with this identity as its only
    /// certificate.
    pub async fn rustls_config(&self) -> Result<RustlsConfig, IdentityError> {
        RustlsConfig::from_der(vec![self.cert_der.clone()], self.key_der.clone())
            .await
            .map_err(IdentityError::Tls)
    }
}

impl std::fmt::Debug for EphemeralIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralIdentity")
            .field("cert_der_len", &self.cert_der.len())
            .finish_non_exhaustive()
    }
}

fn current_year() -> Result<i32, IdentityError> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| IdentityError::Clock)?
        .as_secs();
    Ok(1970 + (secs / SECS_PER_YEAR) as i32)
}
