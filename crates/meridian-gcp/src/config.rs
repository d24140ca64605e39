//! GCP synthesizer configuration

use serde::{Deserialize, Serialize};

/// Where synthesized GCP resources live
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpConfig {
    /// GCP project that owns the service accounts and policies
    pub project_id: String,
    /// Kubernetes cluster name, folded into service account names
    pub cluster_name: String,
}

impl GcpConfig {
    /// Create a config
    pub fn new(project_id: impl Into<String>, cluster_name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            cluster_name: cluster_name.into(),
        }
    }

    /// Workload identity pool of the project (`<project>.svc.id.goog`)
    pub fn workload_identity_pool(&self) -> String {
        format!("{}.svc.id.goog", self.project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_identity_pool() {
        let config = GcpConfig::new("acme-prod", "east-1");
        assert_eq!(config.workload_identity_pool(), "acme-prod.svc.id.goog");
    }
}
