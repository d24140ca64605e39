//! Cluster read access for identity resolution
//!
//! The resolver needs exactly two reads: owner metadata by kind and name,
//! and a pod list by label selector. [`ClusterReader`] is that seam, so tests
//! can mock it while production uses [`KubeClusterReader`].

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams};
use kube::Client;
use serde::de::DeserializeOwned;
use tracing::trace;

#[cfg(test)]
use mockall::automock;

use crate::owner::OwnerKind;

/// Read-only cluster operations used by the resolver
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterReader: Send + Sync {
    /// Fetch the metadata of an owner object
    async fn get_owner(
        &self,
        kind: OwnerKind,
        name: &str,
        namespace: &str,
    ) -> Result<ObjectMeta, kube::Error>;

    /// List pods in a namespace matching a label selector, in API order
    async fn list_pods(&self, namespace: &str, label_selector: &str)
        -> Result<Vec<Pod>, kube::Error>;
}

/// [`ClusterReader`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeClusterReader {
    client: Client,
}

impl KubeClusterReader {
    /// Create a reader from a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Metadata-only get of a namespaced typed resource
    async fn get_metadata<K>(&self, name: &str, namespace: &str) -> Result<ObjectMeta, kube::Error>
    where
        K: kube::Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let partial = api.get_metadata(name).await?;
        Ok(partial.metadata)
    }
}

#[async_trait]
impl ClusterReader for KubeClusterReader {
    async fn get_owner(
        &self,
        kind: OwnerKind,
        name: &str,
        namespace: &str,
    ) -> Result<ObjectMeta, kube::Error> {
        trace!(kind = %kind, name = %name, namespace = %namespace, "Fetching owner metadata");
        match kind {
            OwnerKind::ReplicaSet => self.get_metadata::<ReplicaSet>(name, namespace).await,
            OwnerKind::Deployment => self.get_metadata::<Deployment>(name, namespace).await,
            OwnerKind::StatefulSet => self.get_metadata::<StatefulSet>(name, namespace).await,
            OwnerKind::DaemonSet => self.get_metadata::<DaemonSet>(name, namespace).await,
            OwnerKind::Job => self.get_metadata::<Job>(name, namespace).await,
            OwnerKind::CronJob => self.get_metadata::<CronJob>(name, namespace).await,
        }
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Pod>, kube::Error> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pods = api
            .list(&ListParams::default().labels(label_selector))
            .await?;
        Ok(pods.items)
    }
}
