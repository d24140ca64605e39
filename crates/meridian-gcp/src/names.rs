//! Names for GCP-side resources
//!
//! Every name starts from a readable candidate and is passed through
//! [`truncate_hash_name`] for the ceiling of the system that stores it.
//! The service account id is the display name run through a second,
//! stricter ceiling.

use meridian_common::naming::{
    truncate_hash_name, MAX_DISPLAY_NAME_LENGTH, MAX_GCP_NAME_LENGTH, MAX_K8S_NAME_LENGTH,
};
use meridian_common::NAME_PREFIX;

use crate::config::GcpConfig;

/// Name derivation bound to one project and cluster
#[derive(Clone, Debug)]
pub struct GcpNames<'a> {
    config: &'a GcpConfig,
}

impl<'a> GcpNames<'a> {
    /// Names for the given project and cluster
    pub fn new(config: &'a GcpConfig) -> Self {
        Self { config }
    }

    /// IAMPartialPolicy object name for a client service
    pub fn intent_policy_name(&self, namespace: &str, client_service_name: &str) -> String {
        truncate_hash_name(
            &format!(
                "{}-{}-{}-intent-policy",
                NAME_PREFIX, namespace, client_service_name
            ),
            MAX_K8S_NAME_LENGTH,
        )
    }

    /// IAMPolicyMember object name for a Kubernetes service account
    pub fn workload_identity_policy_name(&self, ksa_name: &str) -> String {
        truncate_hash_name(
            &format!("{}-{}-gcp-identity", NAME_PREFIX, ksa_name),
            MAX_K8S_NAME_LENGTH,
        )
    }

    /// Google service account display name
    pub fn service_account_display_name(&self, namespace: &str, ksa_name: &str) -> String {
        truncate_hash_name(
            &format!(
                "{}-{}-{}-{}",
                NAME_PREFIX, self.config.cluster_name, namespace, ksa_name
            ),
            MAX_DISPLAY_NAME_LENGTH,
        )
    }

    /// Google service account id, chained from the display name
    pub fn service_account_name(&self, namespace: &str, ksa_name: &str) -> String {
        truncate_hash_name(
            &self.service_account_display_name(namespace, ksa_name),
            MAX_GCP_NAME_LENGTH,
        )
    }

    /// Google service account email
    pub fn service_account_email(&self, namespace: &str, ksa_name: &str) -> String {
        format!(
            "{}@{}.iam.gserviceaccount.com",
            self.service_account_name(namespace, ksa_name),
            self.config.project_id
        )
    }

    /// IAM member string for the Google service account
    pub fn service_account_member(&self, namespace: &str, ksa_name: &str) -> String {
        format!(
            "serviceAccount:{}",
            self.service_account_email(namespace, ksa_name)
        )
    }

    /// IAM member string for a Kubernetes service account under workload identity
    pub fn workload_identity_member(&self, namespace: &str, ksa_name: &str) -> String {
        format!(
            "serviceAccount:{}[{}/{}]",
            self.config.workload_identity_pool(),
            namespace,
            ksa_name
        )
    }
}
