//! Common types for Meridian: the ClientIntents CRD, errors, naming and telemetry

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod naming;
pub mod resource;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Label key marking which tool manages a resource
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of [`LABEL_MANAGED_BY`] on resources Meridian synthesizes
pub const LABEL_MANAGED_BY_MERIDIAN: &str = "meridian";

/// Prefix for every cloud-side name Meridian generates
pub const NAME_PREFIX: &str = "mrd";
