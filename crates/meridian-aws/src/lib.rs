//! AWS credentials for Meridian workloads via IAM Roles Anywhere
//!
//! A workload holding an X.509 certificate issued under a trusted anchor
//! trades it for temporary AWS credentials:
//!
//! ```text
//! cert.pem + key.pem + AwsAccount
//!     -> validate (single cert, EC key, same region)
//!     -> signed POST /sessions (AWS4-X509-ECDSA-SHA256)
//!     -> Credentials { access key, secret, token, expiry }
//! ```
//!
//! [`CredentialExchanger`] performs exactly one exchange per call.
//! [`CredentialCache`] adds the per-account single-flight reuse callers need.

#![deny(missing_docs)]

pub mod account;
pub mod arn;
pub mod cache;
pub mod certificate;
pub mod credentials;
pub mod exchange;
pub mod provider;
pub mod session;
pub mod signer;

pub use account::AwsAccount;
pub use arn::Arn;
pub use cache::CredentialCache;
pub use certificate::{ClientCertificate, SigningKey};
pub use credentials::Credentials;
pub use exchange::{CredentialExchanger, ExchangerConfig, SESSION_DURATION};
pub use provider::{CredentialsProvider, ProviderKey};
pub use session::{ReqwestTransport, SessionTransport};
