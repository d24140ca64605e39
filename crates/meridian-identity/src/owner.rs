//! Ownership chain types
//!
//! Pods point at their controllers through owner references. Only the
//! workload kinds listed in [`OwnerKind`] are ever fetched; anything else
//! (custom rollout controllers, operators' own CRDs) is treated as opaque.

use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use serde::{Deserialize, Serialize};

/// Owner kinds the resolver knows how to fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerKind {
    /// apps/v1 ReplicaSet
    ReplicaSet,
    /// apps/v1 Deployment
    Deployment,
    /// apps/v1 StatefulSet
    StatefulSet,
    /// apps/v1 DaemonSet
    DaemonSet,
    /// batch/v1 Job
    Job,
    /// batch/v1 CronJob
    CronJob,
}

impl OwnerKind {
    /// All supported kinds
    pub const ALL: [OwnerKind; 6] = [
        OwnerKind::ReplicaSet,
        OwnerKind::Deployment,
        OwnerKind::StatefulSet,
        OwnerKind::DaemonSet,
        OwnerKind::Job,
        OwnerKind::CronJob,
    ];

    /// Parse an owner reference `kind`; `None` for unsupported kinds
    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == kind)
    }

    /// The Kubernetes kind string
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::ReplicaSet => "ReplicaSet",
            OwnerKind::Deployment => "Deployment",
            OwnerKind::StatefulSet => "StatefulSet",
            OwnerKind::DaemonSet => "DaemonSet",
            OwnerKind::Job => "Job",
            OwnerKind::CronJob => "CronJob",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One edge in a pod's ownership chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerLink {
    /// Raw kind from the owner reference
    pub kind: String,
    /// Owner name
    pub name: String,
    /// Namespace (owners are always in the pod's namespace)
    pub namespace: String,
}

impl OwnerLink {
    /// Build a link from an owner reference
    pub fn from_reference(reference: &OwnerReference, namespace: &str) -> Self {
        Self {
            kind: reference.kind.clone(),
            name: reference.name.clone(),
            namespace: namespace.to_string(),
        }
    }

    /// Supported kind of this link, if any
    pub fn owner_kind(&self) -> Option<OwnerKind> {
        OwnerKind::from_kind(&self.kind)
    }
}

/// The reference to follow: the controller owner if one is marked,
/// otherwise the first reference.
pub fn controlling_reference(references: &[OwnerReference]) -> Option<&OwnerReference> {
    references
        .iter()
        .find(|r| r.controller == Some(true))
        .or_else(|| references.first())
}
