//! Per-account credentials provider

use std::path::{Path, PathBuf};
use std::sync::Arc;

use meridian_common::Result;

use crate::account::AwsAccount;
use crate::credentials::Credentials;
use crate::exchange::CredentialExchanger;

/// Identity of a provider's credentials: the full account and the certificate
/// presented for it. Accounts sharing a role but not a profile or trust anchor
/// get different session policies, so every field takes part.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProviderKey {
    /// Account credentials are issued for
    pub account: AwsAccount,
    /// Client certificate path
    pub cert_path: PathBuf,
}

/// Binds a certificate, key and account to an exchanger.
///
/// Every call performs a fresh exchange; wrap with
/// [`CredentialCache`](crate::cache::CredentialCache) to reuse credentials.
#[derive(Clone)]
pub struct CredentialsProvider {
    cert_path: PathBuf,
    key_path: PathBuf,
    account: AwsAccount,
    exchanger: Arc<CredentialExchanger>,
}

impl CredentialsProvider {
    /// Create a provider
    pub fn new(
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
        account: AwsAccount,
        exchanger: Arc<CredentialExchanger>,
    ) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
            account,
            exchanger,
        }
    }

    /// The account credentials are issued for
    pub fn account(&self) -> &AwsAccount {
        &self.account
    }

    /// Client certificate path
    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    /// Key under which this provider's credentials are cached
    pub fn cache_key(&self) -> ProviderKey {
        ProviderKey {
            account: self.account.clone(),
            cert_path: self.cert_path.clone(),
        }
    }

    /// Exchange the certificate for fresh credentials
    pub async fn provide_credentials(&self) -> Result<Credentials> {
        self.exchanger
            .exchange(&self.cert_path, &self.key_path, &self.account)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::exchange::ExchangerConfig;
    use crate::session::MockSessionTransport;

    #[tokio::test]
    async fn missing_certificate_surfaces_without_network() {
        let mut mock = MockSessionTransport::new();
        mock.expect_send().never();
        let exchanger = Arc::new(CredentialExchanger::with_transport(
            Arc::new(mock),
            ExchangerConfig::default(),
        ));

        let provider = CredentialsProvider::new(
            "/nonexistent/cert.pem",
            "/nonexistent/key.pem",
            AwsAccount::new(
                "arn:aws:rolesanywhere:us-west-2:1:trust-anchor/ta",
                "arn:aws:rolesanywhere:us-west-2:1:profile/p",
                "arn:aws:iam::1:role/r",
            ),
            exchanger,
        );

        assert_eq!(provider.account().role_arn, "arn:aws:iam::1:role/r");
        assert_eq!(provider.cert_path(), Path::new("/nonexistent/cert.pem"));
        assert_eq!(provider.cache_key().account, *provider.account());
        let err = provider.provide_credentials().await.unwrap_err();
        assert!(matches!(err, meridian_common::Error::Io { .. }));
    }

    #[test]
    fn cache_key_covers_profile_and_certificate() {
        let exchanger = Arc::new(CredentialExchanger::with_transport(
            Arc::new(MockSessionTransport::new()),
            ExchangerConfig::default(),
        ));
        let account = |profile: &str| {
            AwsAccount::new(
                "arn:aws:rolesanywhere:us-west-2:1:trust-anchor/ta",
                format!("arn:aws:rolesanywhere:us-west-2:1:profile/{}", profile),
                "arn:aws:iam::1:role/shared",
            )
        };
        let provider = |cert: &str, profile: &str| {
            CredentialsProvider::new(cert, "key.pem", account(profile), exchanger.clone())
        };

        let base = provider("a.pem", "readonly").cache_key();
        assert_eq!(base, provider("a.pem", "readonly").cache_key());
        assert_ne!(base, provider("a.pem", "admin").cache_key());
        assert_ne!(base, provider("b.pem", "readonly").cache_key());
    }
}
