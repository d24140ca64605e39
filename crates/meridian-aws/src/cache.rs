//! Per-account single-flight credential cache
//!
//! One slot per key, each behind its own async mutex. Concurrent callers for
//! the same key queue on the slot, so only the first runs an exchange and the
//! rest receive its result. Different keys never block each other.

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use meridian_common::Result;
use tokio::sync::Mutex;
use tracing::debug;

use crate::credentials::Credentials;
use crate::provider::{CredentialsProvider, ProviderKey};

/// Cached credentials are replaced this long before they expire
pub const DEFAULT_REFRESH_MARGIN_MINUTES: i64 = 5;

type Slot = Arc<Mutex<Option<Credentials>>>;

/// Credential cache keyed by account and certificate
pub struct CredentialCache {
    slots: DashMap<ProviderKey, Slot>,
    refresh_margin: Duration,
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialCache {
    /// Create a cache with the default refresh margin
    pub fn new() -> Self {
        Self::with_refresh_margin(Duration::minutes(DEFAULT_REFRESH_MARGIN_MINUTES))
    }

    /// Create a cache with a custom refresh margin
    pub fn with_refresh_margin(refresh_margin: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            refresh_margin,
        }
    }

    /// Cached credentials for the provider, exchanging when missing or stale
    pub async fn credentials(&self, provider: &CredentialsProvider) -> Result<Credentials> {
        self.get_or_refresh(&provider.cache_key(), move || provider.provide_credentials())
            .await
    }

    /// Return cached credentials for `key`, or run `fetch` and cache its result.
    ///
    /// Failed fetches are not cached.
    pub async fn get_or_refresh<F, Fut>(&self, key: &ProviderKey, fetch: F) -> Result<Credentials>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Credentials>>,
    {
        let slot = self.slot(key);
        let mut cached = slot.lock().await;

        if let Some(credentials) = cached.as_ref() {
            if !credentials.expires_within(Utc::now(), self.refresh_margin) {
                return Ok(credentials.clone());
            }
            debug!(
                role = %key.account.role_arn,
                profile = %key.account.profile_arn,
                expiry = %credentials.expiry,
                "Cached credentials near expiry, refreshing"
            );
        }

        let fresh = fetch().await?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    /// Drop the cached credentials for `key`.
    ///
    /// Waits for an exchange already running on the slot, so the next caller
    /// queues behind the same lock instead of racing it.
    pub async fn invalidate(&self, key: &ProviderKey) {
        let slot = self.slots.get(key).map(|entry| Arc::clone(entry.value()));
        if let Some(slot) = slot {
            *slot.lock().await = None;
        }
    }

    /// Number of keys with a slot
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no key has a slot
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, key: &ProviderKey) -> Slot {
        self.slots.entry(key.clone()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use meridian_common::Error;
    use rcgen::{CertificateParams, KeyPair};
    use tempfile::NamedTempFile;

    use crate::account::AwsAccount;
    use crate::exchange::{CredentialExchanger, ExchangerConfig};
    use crate::session::{HttpResponse, MockSessionTransport};

    const TRUST_ANCHOR: &str = "arn:aws:rolesanywhere:us-west-2:123456789012:trust-anchor/ta";
    const SHARED_ROLE: &str = "arn:aws:iam::123456789012:role/shared";

    fn account(profile: &str) -> AwsAccount {
        AwsAccount::new(
            TRUST_ANCHOR,
            format!("arn:aws:rolesanywhere:us-west-2:123456789012:profile/{}", profile),
            SHARED_ROLE,
        )
    }

    fn key(profile: &str) -> ProviderKey {
        ProviderKey {
            account: account(profile),
            cert_path: PathBuf::from("/etc/meridian/cert.pem"),
        }
    }

    fn credentials(id: &str, valid_for: Duration) -> Credentials {
        Credentials {
            access_key_id: id.to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
            expiry: Utc::now() + valid_for,
            can_expire: true,
        }
    }

    #[tokio::test]
    async fn fresh_credentials_are_reused() {
        let cache = CredentialCache::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let creds = cache
                .get_or_refresh(&key("p"), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(credentials("A", Duration::hours(12)))
                })
                .await
                .unwrap();
            assert_eq!(creds.access_key_id, "A");
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn credentials_near_expiry_are_refreshed() {
        let cache = CredentialCache::new();
        cache
            .get_or_refresh(&key("p"), || async {
                Ok(credentials("OLD", Duration::minutes(2)))
            })
            .await
            .unwrap();

        let creds = cache
            .get_or_refresh(&key("p"), || async {
                Ok(credentials("NEW", Duration::hours(12)))
            })
            .await
            .unwrap();
        assert_eq!(creds.access_key_id, "NEW");
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_exchange() {
        let cache = CredentialCache::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let k = key("p");

        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(credentials("SHARED", Duration::hours(12)))
        };

        let (a, b, c) = tokio::join!(
            cache.get_or_refresh(&k, fetch),
            cache.get_or_refresh(&k, fetch),
            cache.get_or_refresh(&k, fetch),
        );
        assert_eq!(a.unwrap().access_key_id, "SHARED");
        assert_eq!(b.unwrap().access_key_id, "SHARED");
        assert_eq!(c.unwrap().access_key_id, "SHARED");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache = CredentialCache::new();
        let a = cache
            .get_or_refresh(&key("a"), || async { Ok(credentials("A", Duration::hours(1))) })
            .await
            .unwrap();
        let b = cache
            .get_or_refresh(&key("b"), || async { Ok(credentials("B", Duration::hours(1))) })
            .await
            .unwrap();
        assert_ne!(a.access_key_id, b.access_key_id);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = CredentialCache::new();
        let err = cache
            .get_or_refresh(&key("p"), || async {
                Err(Error::external_service("rolesanywhere", "503"))
            })
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let creds = cache
            .get_or_refresh(&key("p"), || async { Ok(credentials("A", Duration::hours(1))) })
            .await
            .unwrap();
        assert_eq!(creds.access_key_id, "A");
    }

    #[tokio::test]
    async fn invalidate_forces_exchange() {
        let cache = CredentialCache::new();
        cache
            .get_or_refresh(&key("p"), || async { Ok(credentials("A", Duration::hours(1))) })
            .await
            .unwrap();
        cache.invalidate(&key("p")).await;

        let creds = cache
            .get_or_refresh(&key("p"), || async { Ok(credentials("B", Duration::hours(1))) })
            .await
            .unwrap();
        assert_eq!(creds.access_key_id, "B");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn invalidate_of_unknown_key_is_noop() {
        let cache = CredentialCache::new();
        cache.invalidate(&key("p")).await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn invalidate_during_exchange_does_not_start_a_second() {
        let cache = CredentialCache::new();
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let exchanges = AtomicUsize::new(0);
        let (in_flight, peak, exchanges) = (&in_flight, &peak, &exchanges);
        let k = key("p");

        let fetch = move || async move {
            let running = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(running, Ordering::SeqCst);
            exchanges.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(credentials("A", Duration::hours(1)))
        };

        let (first, second) = tokio::join!(cache.get_or_refresh(&k, fetch), async {
            cache.invalidate(&k).await;
            cache.get_or_refresh(&k, fetch).await
        });
        first.unwrap();
        second.unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(exchanges.load(Ordering::SeqCst), 2);
    }

    // =========================================================================
    // Providers
    // =========================================================================

    fn write(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    /// Transport that issues an access key named after the requested profile
    fn per_profile_transport() -> MockSessionTransport {
        let expiration = (Utc::now() + Duration::hours(12)).to_rfc3339();
        let mut mock = MockSessionTransport::new();
        mock.expect_send().times(2).returning(move |req| {
            let profile = req
                .url
                .query_pairs()
                .find(|(k, _)| k == "profileArn")
                .map(|(_, v)| v.rsplit('/').next().unwrap_or_default().to_string())
                .unwrap();
            let body = format!(
                r#"{{"credentialSet":[{{"credentials":{{"accessKeyId":"ASIA-{}","secretAccessKey":"s","sessionToken":"t","expiration":"{}"}}}}]}}"#,
                profile, expiration
            );
            Ok(HttpResponse {
                status: 201,
                body: body.into_bytes(),
            })
        });
        mock
    }

    #[tokio::test]
    async fn accounts_sharing_a_role_are_cached_separately() {
        let key_pair = KeyPair::generate().unwrap();
        let cert = CertificateParams::new(vec!["checkout".to_string()])
            .unwrap()
            .self_signed(&key_pair)
            .unwrap();
        let cert_file = write(&cert.pem());
        let key_file = write(&key_pair.serialize_pem());

        let exchanger = Arc::new(CredentialExchanger::with_transport(
            Arc::new(per_profile_transport()),
            ExchangerConfig::default(),
        ));
        let provider = |profile: &str| {
            CredentialsProvider::new(
                cert_file.path(),
                key_file.path(),
                account(profile),
                exchanger.clone(),
            )
        };
        let readonly = provider("readonly");
        let admin = provider("admin");

        let cache = CredentialCache::new();
        let first = cache.credentials(&readonly).await.unwrap();
        let second = cache.credentials(&admin).await.unwrap();
        assert_eq!(first.access_key_id, "ASIA-readonly");
        assert_eq!(second.access_key_id, "ASIA-admin");

        // Both now served from their own slots
        let again = cache.credentials(&readonly).await.unwrap();
        assert_eq!(again.access_key_id, "ASIA-readonly");
        assert_eq!(cache.len(), 2);
    }
}
