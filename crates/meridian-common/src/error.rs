//! Error types for Meridian
//!
//! Errors are structured with fields so callers can tell a configuration
//! problem (never retried) from a transient cluster or cloud failure.
//! The core never logs or reports these itself; it only returns them.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for Meridian operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Invalid input: malformed wildcard, bad certificate file, wrong key
    /// algorithm, mismatched regions, unparseable timestamps
    #[error("validation error [{context}]: {message}")]
    Validation {
        /// What was being validated (e.g. "gcp-policy", "certificate")
        context: String,
        /// Description of what's invalid
        message: String,
        /// The offending field, if one can be named
        field: Option<String>,
    },

    /// No pod matched a ClientIntents label selector
    #[error("no pod found in namespace {namespace} matching {selector}")]
    PodNotFound {
        /// Namespace that was listed
        namespace: String,
        /// Label selector used for the list
        selector: String,
    },

    /// A remote cloud service call failed or returned an unusable answer
    #[error("external service error [{service}]: {message}")]
    ExternalService {
        /// Remote service name (e.g. "rolesanywhere")
        service: String,
        /// Description of what failed
        message: String,
    },

    /// Filesystem error while reading certificates or manifests
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that could not be read
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred
        context: String,
    },
}

impl Error {
    /// Create a validation error with context
    pub fn validation_for(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            context: context.into(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with context and field name
    pub fn validation_for_field(
        context: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            context: context.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a pod-not-found error
    pub fn pod_not_found(namespace: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::PodNotFound {
            namespace: namespace.into(),
            selector: selector.into(),
        }
    }

    /// Create an external service error
    pub fn external_service(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: msg.into(),
        }
    }

    /// Create an IO error for the given path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Validation, serialization and not-found errors need a config or
    /// workload change. Network-facing failures may succeed on a later call.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code)
            ),
            Error::Validation { .. } => false,
            Error::PodNotFound { .. } => false,
            Error::ExternalService { .. } => true,
            Error::Io { .. } => true,
            Error::Serialization { .. } => false,
            Error::Internal { .. } => true,
        }
    }

    /// Whether this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }
}

/// Whether a kube error is an API 403
pub fn is_forbidden(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 403)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "denied".to_string(),
            reason: "Forbidden".to_string(),
            code,
        })
    }

    /// Story: configuration mistakes surface as validation errors and are never retried
    #[test]
    fn story_validation_errors_are_permanent() {
        let err = Error::validation_for_field(
            "gcp-policy",
            "spec.calls[0].name",
            "wildcard must be the last character",
        );
        assert!(err.to_string().contains("validation error [gcp-policy]"));
        assert!(err.is_validation());
        assert!(!err.is_retryable());
        match &err {
            Error::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("spec.calls[0].name"))
            }
            _ => panic!("Expected Validation variant"),
        }
    }

    #[test]
    fn test_pod_not_found_message() {
        let err = Error::pod_not_found("payments", "meridian.dev/client=checkout");
        assert!(err.to_string().contains("payments"));
        assert!(err.to_string().contains("meridian.dev/client=checkout"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_external_service_is_retryable() {
        let err = Error::external_service("rolesanywhere", "503 Service Unavailable");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("[rolesanywhere]"));
    }

    #[test]
    fn test_kube_errors_retry_only_outside_4xx() {
        let err: Error = api_error(403).into();
        assert!(!err.is_retryable());
        let err: Error = api_error(500).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_forbidden_helper() {
        assert!(is_forbidden(&api_error(403)));
        assert!(!is_forbidden(&api_error(404)));
        assert!(!is_forbidden(&api_error(500)));
    }

    #[test]
    fn test_io_error_includes_path() {
        let err = Error::io(
            "/etc/meridian/cert.pem",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().contains("/etc/meridian/cert.pem"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_serialization_for_kind() {
        let err = Error::serialization_for_kind("ClientIntents", "missing field `spec`");
        match &err {
            Error::Serialization { kind, .. } => assert_eq!(kind.as_deref(), Some("ClientIntents")),
            _ => panic!("Expected Serialization variant"),
        }
        assert!(!err.is_retryable());
    }
}
