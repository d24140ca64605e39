//! Metadata and type information for resources Meridian synthesizes
//!
//! The Config Connector objects Meridian emits are plain serde structs, not
//! generated CRD bindings. They share [`ObjectMeta`], and [`HasApiResource`]
//! gives an applier the `ApiResource` it needs for `Api<DynamicObject>`.

use std::collections::BTreeMap;

use kube::discovery::ApiResource;
use serde::{Deserialize, Serialize};

use crate::{LABEL_MANAGED_BY, LABEL_MANAGED_BY_MERIDIAN};

/// Metadata of a synthesized resource; always namespaced and always
/// labelled as managed by Meridian.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name
    pub name: String,
    /// Object namespace
    pub namespace: String,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Metadata carrying the managed-by label
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: BTreeMap::from([(
                LABEL_MANAGED_BY.to_string(),
                LABEL_MANAGED_BY_MERIDIAN.to_string(),
            )]),
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Whether Meridian owns this object
    pub fn is_managed(&self) -> bool {
        self.labels.get(LABEL_MANAGED_BY).map(String::as_str) == Some(LABEL_MANAGED_BY_MERIDIAN)
    }
}

/// A serde type standing in for an external Kubernetes kind.
pub trait HasApiResource {
    /// `group/version`, or just `version` for the core group
    const API_VERSION: &'static str;
    /// Kind
    const KIND: &'static str;
    /// Lowercase plural used in API paths
    const PLURAL: &'static str;

    /// ApiResource for dynamic clients
    fn api_resource() -> ApiResource {
        let (group, version) = Self::API_VERSION
            .split_once('/')
            .unwrap_or(("", Self::API_VERSION));
        ApiResource {
            group: group.to_string(),
            version: version.to_string(),
            api_version: Self::API_VERSION.to_string(),
            kind: Self::KIND.to_string(),
            plural: Self::PLURAL.to_string(),
        }
    }
}
