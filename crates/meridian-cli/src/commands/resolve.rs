//! resolve-pod command - print the service identity of a running pod

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use meridian_identity::{KubeClusterReader, ResolverConfig, ServiceIdResolver};
use tracing::info;

use crate::Result;

/// Default pod annotation carrying a service name override
pub const DEFAULT_OVERRIDE_ANNOTATION: &str = "meridian.dev/service-name";

/// resolve-pod command arguments
#[derive(Args, Debug)]
pub struct ResolvePodArgs {
    /// Namespace of the pod
    #[arg(long, short = 'n')]
    pub namespace: String,

    /// Pod name
    #[arg(long, short = 'p')]
    pub pod: String,

    /// Path to kubeconfig (defaults to in-cluster config or KUBECONFIG)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Pod annotation whose value overrides the service name; empty disables overrides
    #[arg(
        long,
        env = "MERIDIAN_SERVICE_NAME_OVERRIDE_ANNOTATION",
        default_value = DEFAULT_OVERRIDE_ANNOTATION
    )]
    pub override_annotation: String,

    /// Name Job-owned pods after their first container image
    #[arg(long, env = "MERIDIAN_USE_IMAGE_NAME_FOR_JOBS")]
    pub use_image_name_for_jobs: bool,
}

impl ResolvePodArgs {
    /// Resolver configuration from the arguments
    pub fn resolver_config(&self) -> ResolverConfig {
        let config =
            ResolverConfig::default().with_image_name_for_jobs(self.use_image_name_for_jobs);
        if self.override_annotation.is_empty() {
            config
        } else {
            config.with_override_annotation(self.override_annotation.clone())
        }
    }
}

/// Run the resolve-pod command
pub async fn run(args: ResolvePodArgs) -> Result<()> {
    let client = super::kube_client(args.kubeconfig.as_deref()).await?;

    let pods: Api<Pod> = Api::namespaced(client.clone(), &args.namespace);
    let pod = pods.get(&args.pod).await?;

    let resolver = ServiceIdResolver::new(
        Arc::new(KubeClusterReader::new(client)),
        args.resolver_config(),
    );
    let identity = resolver.resolve_pod_to_service_identity(&pod).await?;

    info!(
        pod = %args.pod,
        namespace = %identity.namespace,
        service = %identity.name,
        "Resolved service identity"
    );
    println!("{}", serde_json::to_string_pretty(&identity)?);

    Ok(())
}
