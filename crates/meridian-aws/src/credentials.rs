//! Temporary AWS credentials

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use meridian_common::{Error, Result};
use serde::Serialize;

/// Temporary credentials issued by one exchange.
///
/// Immutable once built; the caller owns caching and refresh.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token
    pub session_token: String,
    /// When the credentials stop working
    pub expiry: DateTime<Utc>,
    /// Whether `expiry` applies
    pub can_expire: bool,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("expiry", &self.expiry)
            .field("can_expire", &self.can_expire)
            .finish_non_exhaustive()
    }
}

/// `credential_process` output understood by AWS SDKs and the CLI
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialProcessOutput<'a> {
    version: u8,
    access_key_id: &'a str,
    secret_access_key: &'a str,
    session_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration: Option<String>,
}

impl Credentials {
    /// Whether the credentials expire within `margin` of `now`
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.can_expire && self.expiry - margin <= now
    }

    /// Whether the credentials have expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_within(now, Duration::zero())
    }

    /// Render as `credential_process` JSON
    pub fn to_credential_process_json(&self) -> Result<String> {
        let output = CredentialProcessOutput {
            version: 1,
            access_key_id: &self.access_key_id,
            secret_access_key: &self.secret_access_key,
            session_token: &self.session_token,
            expiration: self
                .can_expire
                .then(|| self.expiry.to_rfc3339_opts(SecondsFormat::Secs, true)),
        };
        serde_json::to_string(&output).map_err(|e| {
            Error::serialization_for_kind("credential_process", e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credentials(expiry: DateTime<Utc>) -> Credentials {
        Credentials {
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
            expiry,
            can_expire: true,
        }
    }

    #[test]
    fn test_credential_process_json() {
        let expiry = Utc.with_ymd_and_hms(2026, 10, 18, 21, 0, 0).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&credentials(expiry).to_credential_process_json().unwrap())
                .unwrap();
        assert_eq!(json["Version"], 1);
        assert_eq!(json["AccessKeyId"], "ASIAEXAMPLE");
        assert_eq!(json["SecretAccessKey"], "secret");
        assert_eq!(json["SessionToken"], "token");
        assert_eq!(json["Expiration"], "2026-10-18T21:00:00Z");
    }

    #[test]
    fn test_expiry_margin() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let creds = credentials(now + Duration::minutes(4));
        assert!(creds.expires_within(now, Duration::minutes(5)));
        assert!(!creds.expires_within(now, Duration::minutes(3)));
        assert!(!creds.is_expired_at(now));
        assert!(creds.is_expired_at(now + Duration::minutes(4)));
    }

    #[test]
    fn test_non_expiring_credentials() {
        let now = Utc::now();
        let mut creds = credentials(now - Duration::hours(1));
        creds.can_expire = false;
        assert!(!creds.is_expired_at(now));
        let json = creds.to_credential_process_json().unwrap();
        assert!(!json.contains("Expiration"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", credentials(Utc::now()));
        assert!(debug.contains("ASIAEXAMPLE"));
        assert!(!debug.contains("secret\""));
        assert!(!debug.contains("token\""));
    }
}
