//! Roles Anywhere `CreateSession` wire types and HTTP transport
//!
//! The transport is a trait so the exchange pipeline can be tested without
//! a network; [`ReqwestTransport`] is the production implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use meridian_common::{Error, Result};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use tracing::trace;

#[cfg(test)]
use mockall::automock;

/// Service name used for signing scopes and error context
pub const SERVICE: &str = "rolesanywhere";

/// Path of the CreateSession operation
pub const CREATE_SESSION_PATH: &str = "/sessions";

/// Default HTTP timeout for a CreateSession call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default Roles Anywhere endpoint for a region
pub fn regional_endpoint(region: &str) -> String {
    format!("https://{}.{}.amazonaws.com", SERVICE, region)
}

/// JSON body of a CreateSession request
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionBody {
    /// Requested session lifetime
    pub duration_seconds: u64,
}

/// JSON body of a CreateSession response
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    /// Issued credential sets; the first one is used
    #[serde(default)]
    pub credential_set: Vec<CredentialSet>,
    /// Subject the session was issued to
    #[serde(default)]
    pub subject_arn: Option<String>,
}

/// One issued credential set
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSet {
    /// Temporary credentials
    pub credentials: SessionCredentials,
    /// Role the credentials act as
    #[serde(default)]
    pub role_arn: Option<String>,
}

/// Temporary credentials as returned on the wire
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token
    pub session_token: String,
    /// Expiration, RFC 3339
    pub expiration: String,
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

/// A fully built HTTP request
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL including the query string
    pub url: Url,
    /// Headers, keyed by lowercase name
    pub headers: BTreeMap<String, String>,
    /// Request body
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Header value by lowercase name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Status and body of an HTTP response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends signed CreateSession requests
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Send a request and return the raw response.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`SessionTransport`] over reqwest with rustls, TLS 1.2 minimum
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::internal_with_context(SERVICE, format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SessionTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        trace!(method = %request.method, url = %request.url, "Sending CreateSession request");

        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| Error::external_service(SERVICE, format!("request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            Error::external_service(SERVICE, format!("failed to read response body: {}", e))
        })?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_session_response() {
        let body = r#"{
            "credentialSet": [{
                "assumedRoleUser": {"arn": "arn:aws:sts::123:assumed-role/checkout/abc", "assumedRoleId": "AROA:abc"},
                "credentials": {
                    "accessKeyId": "ASIAEXAMPLE",
                    "secretAccessKey": "secret",
                    "sessionToken": "token",
                    "expiration": "2026-10-18T12:00:00Z"
                },
                "packedPolicySize": 0,
                "roleArn": "arn:aws:iam::123:role/checkout",
                "sourceIdentity": "CN=workload"
            }],
            "subjectArn": "arn:aws:rolesanywhere:us-west-2:123:subject/s"
        }"#;
        let response: CreateSessionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.credential_set.len(), 1);
        assert_eq!(
            response.credential_set[0].credentials.access_key_id,
            "ASIAEXAMPLE"
        );
        assert!(response.subject_arn.is_some());
    }

    #[test]
    fn test_empty_response_has_no_credential_sets() {
        let response: CreateSessionResponse = serde_json::from_str("{}").unwrap();
        assert!(response.credential_set.is_empty());
    }

    #[test]
    fn test_session_credentials_debug_hides_secrets() {
        let creds = SessionCredentials {
            access_key_id: "ASIA".to_string(),
            secret_access_key: "super-secret".to_string(),
            session_token: "token-value".to_string(),
            expiration: "2026-10-18T12:00:00Z".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("token-value"));
    }

    #[test]
    fn test_body_and_endpoint() {
        let body = serde_json::to_string(&CreateSessionBody {
            duration_seconds: 43200,
        })
        .unwrap();
        assert_eq!(body, r#"{"durationSeconds":43200}"#);
        assert_eq!(
            regional_endpoint("us-west-2"),
            "https://rolesanywhere.us-west-2.amazonaws.com"
        );
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse { status: 201, body: vec![] }.is_success());
        assert!(!HttpResponse { status: 403, body: vec![] }.is_success());
    }
}
