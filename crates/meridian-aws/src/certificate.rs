//! Client certificate and private key loading
//!
//! Roles Anywhere authenticates a request with an end-entity certificate and
//! an ECDSA signature made with its private key. Both files are validated
//! fully here so that a bad file never reaches the network.

use std::path::Path;

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use meridian_common::{Error, Result};
use x509_parser::der_parser::der::parse_der;
use x509_parser::oid_registry::OID_KEY_TYPE_EC_PUBLIC_KEY;
use x509_parser::prelude::{FromDer, X509Certificate};

const CERT_CONTEXT: &str = "certificate";
const KEY_CONTEXT: &str = "private-key";

/// A parsed client certificate
#[derive(Clone, Debug)]
pub struct ClientCertificate {
    der: Vec<u8>,
    serial: String,
    public_key: Vec<u8>,
}

impl ClientCertificate {
    /// Read a PEM file holding exactly one certificate
    pub fn from_pem_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_pem(&data)
    }

    /// Parse PEM data holding exactly one certificate.
    ///
    /// Anything other than whitespace after the first PEM block is rejected.
    pub fn from_pem(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data).map_err(|_| {
            Error::validation_for(CERT_CONTEXT, "certificate file is not valid UTF-8")
        })?;

        let (begin, end) = first_block(text).ok_or_else(|| {
            Error::validation_for(CERT_CONTEXT, "no PEM block found in cert file")
        })?;
        if !text[end..].trim().is_empty() {
            return Err(Error::validation_for(
                CERT_CONTEXT,
                "multiple certificates found in cert file",
            ));
        }

        let block = pem::parse(&text[begin..end]).map_err(|e| {
            Error::validation_for(CERT_CONTEXT, format!("failed to parse PEM: {}", e))
        })?;
        if block.tag() != "CERTIFICATE" {
            return Err(Error::validation_for(
                CERT_CONTEXT,
                format!("expected a CERTIFICATE PEM block, found {}", block.tag()),
            ));
        }

        Self::from_der(block.contents())
    }

    /// Parse a DER-encoded certificate
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der).map_err(|e| {
            Error::validation_for(CERT_CONTEXT, format!("failed to parse certificate: {}", e))
        })?;

        Ok(Self {
            der: der.to_vec(),
            serial: cert.tbs_certificate.serial.to_string(),
            public_key: cert.public_key().subject_public_key.data.to_vec(),
        })
    }

    /// DER bytes
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Serial number in decimal
    pub fn serial_number(&self) -> &str {
        &self.serial
    }

    /// Base64 of the DER bytes, as carried in headers and request bodies
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.der)
    }

    /// Raw subject public key bits
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}

/// Byte range of the first PEM block, from `-----BEGIN` to the end of its
/// `-----END ...-----` line
fn first_block(text: &str) -> Option<(usize, usize)> {
    let begin = text.find("-----BEGIN ")?;
    let end_marker = begin + text[begin..].find("-----END ")?;
    let label_start = end_marker + "-----END ".len();
    let end = label_start + text[label_start..].find("-----")? + "-----".len();
    Some((begin, end))
}

/// An ECDSA P-256 private key
pub struct SigningKey {
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Read a PEM private key file
    pub fn from_pem_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_pem(&data)
    }

    /// Parse a PEM private key; only elliptic-curve keys are accepted.
    ///
    /// Accepts SEC1 (`EC PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) encodings.
    pub fn from_pem(data: &[u8]) -> Result<Self> {
        let block = pem::parse(data).map_err(|e| {
            Error::validation_for(KEY_CONTEXT, format!("failed to parse private key: {}", e))
        })?;

        let key_pair = match block.tag() {
            "EC PRIVATE KEY" => EcdsaKeyPair::from_private_key_der(
                &ECDSA_P256_SHA256_ASN1_SIGNING,
                block.contents(),
            )
            .map_err(|e| unsupported_curve(&e))?,
            "PRIVATE KEY" => {
                if !pkcs8_is_elliptic_curve(block.contents()) {
                    return Err(not_elliptic_curve());
                }
                EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, block.contents())
                    .map_err(|e| unsupported_curve(&e))?
            }
            _ => return Err(not_elliptic_curve()),
        };

        Ok(Self {
            key_pair,
            rng: SystemRandom::new(),
        })
    }

    /// Uncompressed public key point
    pub fn public_key(&self) -> &[u8] {
        self.key_pair.public_key().as_ref()
    }

    /// Sign a message with ECDSA P-256/SHA-256, returning the DER signature
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signature = self.key_pair.sign(&self.rng, message).map_err(|_| {
            Error::internal_with_context(KEY_CONTEXT, "ECDSA signing failed")
        })?;
        Ok(signature.as_ref().to_vec())
    }

    /// Check that this key belongs to the certificate
    pub fn ensure_matches(&self, certificate: &ClientCertificate) -> Result<()> {
        if self.public_key() != certificate.public_key() {
            return Err(Error::validation_for(
                KEY_CONTEXT,
                "private key does not match the certificate",
            ));
        }
        Ok(())
    }
}

fn not_elliptic_curve() -> Error {
    Error::validation_for(KEY_CONTEXT, "private key must be an ECDSA key")
}

fn unsupported_curve(e: &impl std::fmt::Display) -> Error {
    Error::validation_for(
        KEY_CONTEXT,
        format!("unsupported elliptic-curve key, only P-256 is supported: {}", e),
    )
}

/// Whether a PKCS#8 `PrivateKeyInfo` names `id-ecPublicKey` as its algorithm
fn pkcs8_is_elliptic_curve(der: &[u8]) -> bool {
    let Ok((_, info)) = parse_der(der) else {
        return false;
    };
    info.as_sequence()
        .ok()
        .and_then(|fields| fields.get(1))
        .and_then(|algorithm| algorithm.as_sequence().ok())
        .and_then(|algorithm| algorithm.first())
        .and_then(|oid| oid.as_oid().ok())
        .is_some_and(|oid| *oid == OID_KEY_TYPE_EC_PUBLIC_KEY)
}
