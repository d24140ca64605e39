//! Pod -> service identity resolution
//!
//! Resolution order, first match wins:
//!
//! 1. A non-empty value in the configured override annotation, used verbatim
//! 2. A pod without owner references is named after itself
//! 3. The owner chain is walked upward through supported kinds
//!    (ReplicaSet -> Deployment, Job -> CronJob). A 403 on any fetch stops
//!    the walk and the reference being fetched supplies the name.
//! 4. Job-owned pods may be named after their first container image
//! 5. Dots become underscores
//!
//! The namespace is always the pod's namespace.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use meridian_common::crd::ClientIntents;
use meridian_common::error::is_forbidden;
use meridian_common::{Error, Result};

use crate::client::ClusterReader;
use crate::config::ResolverConfig;
use crate::owner::{controlling_reference, OwnerKind, OwnerLink};

/// Upper bound on owner hops; real chains are at most two deep
const MAX_OWNER_DEPTH: usize = 8;

/// The stable logical name of a workload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceIdentity {
    /// Service name
    pub name: String,
    /// Namespace of the pod
    pub namespace: String,
    /// Kind of the owner the name came from; `None` for overrides and bare pods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_kind: Option<OwnerKind>,
}

/// Result of one owner fetch, with 403 split out so the walk can degrade
#[derive(Debug)]
enum FetchOutcome {
    Found(ObjectMeta),
    Forbidden,
    Failed(kube::Error),
}

impl From<std::result::Result<ObjectMeta, kube::Error>> for FetchOutcome {
    fn from(result: std::result::Result<ObjectMeta, kube::Error>) -> Self {
        match result {
            Ok(meta) => FetchOutcome::Found(meta),
            Err(e) if is_forbidden(&e) => FetchOutcome::Forbidden,
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

/// Where the owner walk ended
#[derive(Debug, PartialEq, Eq)]
struct ResolvedOwner {
    name: String,
    kind: Option<OwnerKind>,
}

/// Maps pods to service identities
pub struct ServiceIdResolver {
    client: Arc<dyn ClusterReader>,
    config: ResolverConfig,
}

impl ServiceIdResolver {
    /// Create a resolver over the given cluster reader
    pub fn new(client: Arc<dyn ClusterReader>, config: ResolverConfig) -> Self {
        Self { client, config }
    }

    /// The configuration this resolver was built with
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a pod to its service identity
    pub async fn resolve_pod_to_service_identity(&self, pod: &Pod) -> Result<ServiceIdentity> {
        let namespace = pod.namespace().unwrap_or_default();

        if let Some(name) = self.annotated_name(pod) {
            debug!(
                pod = %pod.name_any(),
                service = %name,
                "Using service name override annotation"
            );
            return Ok(ServiceIdentity {
                name: name.to_string(),
                namespace,
                owner_kind: None,
            });
        }

        let owner = self.resolve_owner(pod, &namespace).await?;

        let name = match owner.kind {
            // References like "registry/" have no usable short name
            Some(OwnerKind::Job) if self.config.use_image_name_for_jobs => {
                first_container_image(pod)
                    .map(image_short_name)
                    .filter(|short| !short.is_empty())
                    .map(str::to_string)
                    .unwrap_or(owner.name)
            }
            _ => owner.name,
        };

        Ok(ServiceIdentity {
            name: normalize_service_name(&name),
            namespace,
            owner_kind: owner.kind,
        })
    }

    /// Find a pod of the client service declared by a ClientIntents.
    ///
    /// Returns the first pod in list order when several match.
    pub async fn resolve_client_intent_to_pod(&self, intents: &ClientIntents) -> Result<Pod> {
        let namespace = intents.namespace().unwrap_or_default();
        let selector = intents.build_pod_label_selector();

        let pods = self.client.list_pods(&namespace, &selector).await?;
        trace!(
            namespace = %namespace,
            selector = %selector,
            count = pods.len(),
            "Listed client pods"
        );

        pods.into_iter()
            .next()
            .ok_or_else(|| Error::pod_not_found(namespace, selector))
    }

    /// Find a pod of the client service and resolve its identity
    pub async fn resolve_client_intent_to_service_identity(
        &self,
        intents: &ClientIntents,
    ) -> Result<ServiceIdentity> {
        let pod = self.resolve_client_intent_to_pod(intents).await?;
        self.resolve_pod_to_service_identity(&pod).await
    }

    /// Non-empty override annotation value, if an override key is configured
    fn annotated_name<'a>(&self, pod: &'a Pod) -> Option<&'a str> {
        let key = self.config.service_name_override_annotation.as_deref()?;
        pod.annotations()
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    async fn resolve_owner(&self, pod: &Pod, namespace: &str) -> Result<ResolvedOwner> {
        let Some(reference) = controlling_reference(pod.owner_references()) else {
            return Ok(ResolvedOwner {
                name: pod.name_any(),
                kind: None,
            });
        };

        let mut current = OwnerLink::from_reference(reference, namespace);

        for _ in 0..MAX_OWNER_DEPTH {
            let Some(kind) = current.owner_kind() else {
                debug!(
                    kind = %current.kind,
                    name = %current.name,
                    "Unsupported owner kind, using reference name"
                );
                return Ok(ResolvedOwner {
                    name: current.name,
                    kind: None,
                });
            };

            let outcome: FetchOutcome = self
                .client
                .get_owner(kind, &current.name, namespace)
                .await
                .into();

            match outcome {
                FetchOutcome::Found(meta) => {
                    let parent = meta
                        .owner_references
                        .as_deref()
                        .and_then(controlling_reference)
                        .filter(|r| OwnerKind::from_kind(&r.kind).is_some());

                    match parent {
                        Some(parent) => {
                            trace!(
                                from = %current.name,
                                to = %parent.name,
                                "Following owner reference"
                            );
                            current = OwnerLink::from_reference(parent, namespace);
                        }
                        None => {
                            return Ok(ResolvedOwner {
                                name: meta.name.unwrap_or(current.name),
                                kind: Some(kind),
                            })
                        }
                    }
                }
                FetchOutcome::Forbidden => {
                    debug!(
                        kind = %kind,
                        name = %current.name,
                        namespace = %namespace,
                        "Owner read forbidden, using owner reference name"
                    );
                    return Ok(ResolvedOwner {
                        name: current.name,
                        kind: Some(kind),
                    });
                }
                FetchOutcome::Failed(e) => return Err(e.into()),
            }
        }

        debug!(name = %current.name, "Owner chain too deep, stopping walk");
        let kind = current.owner_kind();
        Ok(ResolvedOwner {
            name: current.name,
            kind,
        })
    }
}

fn first_container_image(pod: &Pod) -> Option<&str> {
    pod.spec
        .as_ref()?
        .containers
        .first()?
        .image
        .as_deref()
        .filter(|image| !image.is_empty())
}

/// Final path segment of an image reference without tag or digest.
///
/// `registry.example.com:5000/team/app:1.2@sha256:...` -> `app`
pub fn image_short_name(image: &str) -> &str {
    let without_digest = image.split('@').next().unwrap_or(image);
    let last_segment = without_digest.rsplit('/').next().unwrap_or(without_digest);
    last_segment.split(':').next().unwrap_or(last_segment)
}

/// Replace characters that are unsafe in cloud identifiers
pub fn normalize_service_name(name: &str) -> String {
    name.replace('.', "_")
}
