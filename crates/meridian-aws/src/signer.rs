//! Roles Anywhere request signing (`AWS4-X509-ECDSA-SHA256`)
//!
//! SigV4 with the HMAC chain replaced by an ECDSA signature from the
//! certificate's private key. The credential scope is prefixed with the
//! certificate serial number instead of an access key id, and the DER
//! certificate travels base64-encoded in `x-amz-x509`.
//!
//! ```text
//! CanonicalRequest = Method \n Path \n Query \n Headers \n SignedHeaders \n hex(SHA256(Body))
//! StringToSign     = Algorithm \n AmzDate \n Scope \n hex(SHA256(CanonicalRequest))
//! Authorization    = Algorithm Credential=<serial>/<scope>, SignedHeaders=..., Signature=hex(sig)
//! ```

use std::fmt::Write;

use aws_lc_rs::digest;
use chrono::{DateTime, Utc};
use meridian_common::{Error, Result};

use crate::certificate::{ClientCertificate, SigningKey};
use crate::session::{HttpRequest, SERVICE};

/// Signing algorithm identifier
pub const ALGORITHM: &str = "AWS4-X509-ECDSA-SHA256";

const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const SCOPE_DATE_FORMAT: &str = "%Y%m%d";

/// Signs requests with a client certificate and its key
pub struct RequestSigner<'a> {
    certificate: &'a ClientCertificate,
    key: &'a SigningKey,
    region: &'a str,
}

impl<'a> RequestSigner<'a> {
    /// Create a signer for one region
    pub fn new(certificate: &'a ClientCertificate, key: &'a SigningKey, region: &'a str) -> Self {
        Self {
            certificate,
            key,
            region,
        }
    }

    /// Add the signing headers and `authorization` to a request.
    ///
    /// `host`, `x-amz-date` and `x-amz-x509` are set here; every header
    /// present when this is called is signed.
    pub fn sign(&self, request: &mut HttpRequest, now: DateTime<Utc>) -> Result<()> {
        let amz_date = now.format(AMZ_DATE_FORMAT).to_string();
        let scope = format!(
            "{}/{}/{}/aws4_request",
            now.format(SCOPE_DATE_FORMAT),
            self.region,
            SERVICE
        );

        request
            .headers
            .insert("host".to_string(), host_header(&request.url)?);
        request
            .headers
            .insert("x-amz-date".to_string(), amz_date.clone());
        request
            .headers
            .insert("x-amz-x509".to_string(), self.certificate.to_base64());

        let signed_headers = request
            .headers
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";");
        let canonical = canonical_request(request, &signed_headers);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex_sha256(canonical.as_bytes())
        );

        let signature = self.key.sign(string_to_sign.as_bytes())?;
        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.certificate.serial_number(),
            scope,
            signed_headers,
            hex(&signature)
        );
        request
            .headers
            .insert("authorization".to_string(), authorization);

        Ok(())
    }
}

/// SigV4 canonical request over the given signed header list
pub fn canonical_request(request: &HttpRequest, signed_headers: &str) -> String {
    let mut headers = String::new();
    for name in signed_headers.split(';') {
        let value = request.header(name).unwrap_or_default();
        let _ = writeln!(headers, "{}:{}", name, value.trim());
    }

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method.as_str(),
        canonical_path(request.url.path()),
        canonical_query(&request.url),
        headers,
        signed_headers,
        hex_sha256(&request.body)
    )
}

/// Query string with sorted, SigV4-encoded pairs
pub fn canonical_query(url: &reqwest::Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                urlencoding::encode(&k).into_owned(),
                urlencoding::encode(&v).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Path with each segment encoded and `/` kept
fn canonical_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

fn host_header(url: &reqwest::Url) -> Result<String> {
    let host = url.host_str().ok_or_else(|| {
        Error::validation_for_field(SERVICE, "endpoint", format!("URL has no host: {}", url))
    })?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn hex_sha256(data: &[u8]) -> String {
    hex(digest::digest(&digest::SHA256, data).as_ref())
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
            let _ = write!(s, "{:02x}", b);
            s
        })
}
