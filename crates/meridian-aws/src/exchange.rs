//! Certificate -> temporary credentials exchange
//!
//! A fail-fast pipeline with no retries or caching:
//!
//! 1. Certificate file: exactly one PEM certificate
//! 2. Key file: an elliptic-curve key matching the certificate
//! 3. Account: trust anchor and profile in the same region
//! 4. Signed `CreateSession` over TLS 1.2+
//! 5. At least one credential set with an RFC 3339 expiration
//!
//! Steps 1-3 run before any network call.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use meridian_common::{Error, Result};
use reqwest::{Method, Url};
use tracing::debug;

use crate::account::AwsAccount;
use crate::certificate::{ClientCertificate, SigningKey};
use crate::credentials::Credentials;
use crate::session::{
    regional_endpoint, CreateSessionBody, CreateSessionResponse, HttpRequest, ReqwestTransport,
    SessionTransport, CREATE_SESSION_PATH, DEFAULT_REQUEST_TIMEOUT, SERVICE,
};
use crate::signer::RequestSigner;

/// Session lifetime requested from Roles Anywhere (12 hours); not configurable
pub const SESSION_DURATION: Duration = Duration::from_secs(43_200);

/// Exchanger settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangerConfig {
    /// Base URL used instead of the regional endpoint
    pub endpoint_override: Option<String>,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl Default for ExchangerConfig {
    fn default() -> Self {
        Self {
            endpoint_override: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Exchanges a client certificate for temporary AWS credentials
pub struct CredentialExchanger {
    transport: Arc<dyn SessionTransport>,
    config: ExchangerConfig,
}

impl CredentialExchanger {
    /// Create an exchanger using the HTTPS transport
    pub fn new(config: ExchangerConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Create an exchanger over a custom transport
    pub fn with_transport(transport: Arc<dyn SessionTransport>, config: ExchangerConfig) -> Self {
        Self { transport, config }
    }

    /// Read the certificate and key files and exchange them for credentials
    pub async fn exchange(
        &self,
        cert_path: &Path,
        key_path: &Path,
        account: &AwsAccount,
    ) -> Result<Credentials> {
        let certificate = ClientCertificate::from_pem_file(cert_path)?;
        let key = SigningKey::from_pem_file(key_path)?;
        self.exchange_with(&certificate, &key, account).await
    }

    /// Exchange an already loaded certificate and key for credentials
    pub async fn exchange_with(
        &self,
        certificate: &ClientCertificate,
        key: &SigningKey,
        account: &AwsAccount,
    ) -> Result<Credentials> {
        key.ensure_matches(certificate)?;
        let region = account.region()?;

        let mut request = self.build_request(&region, account)?;
        RequestSigner::new(certificate, key, &region).sign(&mut request, Utc::now())?;

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(Error::external_service(
                SERVICE,
                format!(
                    "CreateSession returned HTTP {}: {}",
                    response.status,
                    String::from_utf8_lossy(&response.body)
                ),
            ));
        }

        let parsed: CreateSessionResponse = serde_json::from_slice(&response.body)
            .map_err(|e| {
                Error::external_service(SERVICE, format!("invalid CreateSession response: {}", e))
            })?;

        let credentials = parsed
            .credential_set
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::external_service(
                    SERVICE,
                    "unable to obtain temporary security credentials from CreateSession",
                )
            })?
            .credentials;

        let expiry = DateTime::parse_from_rfc3339(&credentials.expiration)
            .map_err(|e| {
                Error::validation_for_field(
                    SERVICE,
                    "expiration",
                    format!(
                        "failed to parse expiration time {:?}: {}",
                        credentials.expiration, e
                    ),
                )
            })?
            .with_timezone(&Utc);

        debug!(
            region = %region,
            role_arn = %account.role_arn,
            access_key_id = %credentials.access_key_id,
            expiry = %expiry,
            "Created Roles Anywhere session"
        );

        Ok(Credentials {
            access_key_id: credentials.access_key_id,
            secret_access_key: credentials.secret_access_key,
            session_token: credentials.session_token,
            expiry,
            can_expire: true,
        })
    }

    fn build_request(&self, region: &str, account: &AwsAccount) -> Result<HttpRequest> {
        let base = self
            .config
            .endpoint_override
            .clone()
            .unwrap_or_else(|| regional_endpoint(region));
        let mut url = Url::parse(&base)
            .and_then(|base| base.join(CREATE_SESSION_PATH))
            .map_err(|e| {
                Error::validation_for_field(
                    SERVICE,
                    "endpoint",
                    format!("invalid endpoint {}: {}", base, e),
                )
            })?;

        let query = [
            ("profileArn", account.profile_arn.as_str()),
            ("roleArn", account.role_arn.as_str()),
            ("trustAnchorArn", account.trust_anchor_arn.as_str()),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
        url.set_query(Some(&query));

        let body = serde_json::to_vec(&CreateSessionBody {
            duration_seconds: SESSION_DURATION.as_secs(),
        })
        .map_err(|e| Error::serialization_for_kind("CreateSession", e.to_string()))?;

        Ok(HttpRequest {
            method: Method::POST,
            url,
            headers: [("content-type".to_string(), "application/json".to_string())]
                .into_iter()
                .collect(),
            body,
        })
    }
}
