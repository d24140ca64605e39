//! Service identity resolution for Meridian
//!
//! Maps a running pod to the stable logical name of the workload it belongs
//! to, and finds a representative pod for a ClientIntents resource.
//!
//! ```text
//! Pod --owner refs--> ReplicaSet --> Deployment   => "deployment-name"
//! Pod --owner refs--> Job --> CronJob             => "cronjob-name"
//! Pod (annotated)                                 => annotation value
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod owner;
pub mod resolver;

pub use client::{ClusterReader, KubeClusterReader};
pub use config::ResolverConfig;
pub use owner::{OwnerKind, OwnerLink};
pub use resolver::{image_short_name, normalize_service_name, ServiceIdResolver, ServiceIdentity};
