//! ClientIntents Custom Resource Definition
//!
//! A ClientIntents object declares what a client service needs: each entry
//! in `calls` names a target resource and the permissions wanted on it.
//!
//! ```yaml
//! apiVersion: meridian.dev/v1alpha1
//! kind: ClientIntents
//! metadata:
//!   name: checkout
//!   namespace: payments
//! spec:
//!   service:
//!     name: checkout
//!   calls:
//!     - name: projects/_/buckets/receipts-*
//!       type: gcp
//!       permissions: ["storage.objectViewer"]
//! ```

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::naming::{deterministic_hash, truncate, TRUNCATED_HASH_LENGTH};

/// Label carried by pods that belong to a client service
pub const CLIENT_LABEL_KEY: &str = "meridian.dev/client";

/// Per-part ceiling when building the formatted identity label value
const MAX_IDENTITY_PART_LENGTH: usize = 20;

/// Spec for a ClientIntents resource
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "meridian.dev",
    version = "v1alpha1",
    kind = "ClientIntents",
    plural = "clientintents",
    shortname = "ci",
    namespaced,
    printcolumn = r#"{"name":"Service","type":"string","jsonPath":".spec.service.name"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClientIntentsSpec {
    /// The client service issuing the intents
    pub service: Service,

    /// Declared intents, in order
    #[serde(default)]
    pub calls: Vec<Intent>,
}

/// A named service
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Service {
    /// Service name
    pub name: String,
}

/// Which system an intent targets
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    /// In-cluster HTTP call
    Http,
    /// GCP resource access
    Gcp,
    /// AWS resource access
    Aws,
}

/// "This service needs these permissions on that resource"
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Target resource name; may end in a single `*` wildcard
    pub name: String,

    /// Target system
    #[serde(rename = "type")]
    pub type_: IntentType,

    /// Permissions requested on the target, in order
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Intent {
    /// Create an intent
    pub fn new(
        name: impl Into<String>,
        type_: IntentType,
        permissions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            type_,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

impl ClientIntents {
    /// Name of the client service
    pub fn service_name(&self) -> &str {
        &self.spec.service.name
    }

    /// Intents targeting one system, in declared order
    pub fn intents_of_type(&self, type_: IntentType) -> Vec<Intent> {
        self.spec
            .calls
            .iter()
            .filter(|intent| intent.type_ == type_)
            .cloned()
            .collect()
    }

    /// Label selector matching the pods of this client service
    pub fn build_pod_label_selector(&self) -> String {
        let namespace = self.namespace().unwrap_or_default();
        format!(
            "{}={}",
            CLIENT_LABEL_KEY,
            formatted_identity(self.service_name(), &namespace)
        )
    }
}

/// Label-safe identity value for a service: truncated name and namespace
/// plus a hash of both, so truncation never merges two services.
pub fn formatted_identity(name: &str, namespace: &str) -> String {
    let hash = deterministic_hash(&format!("{}-{}", name, namespace));
    format!(
        "{}-{}-{}",
        truncate(name, MAX_IDENTITY_PART_LENGTH),
        truncate(namespace, MAX_IDENTITY_PART_LENGTH),
        &hash[..TRUNCATED_HASH_LENGTH]
    )
}
