//! gcp-policy command - render Config Connector IAM resources
//!
//! Reads a ClientIntents manifest and prints, as a multi-document YAML
//! stream, the IAMServiceAccount, IAMPolicyMember and IAMPartialPolicy for
//! its GCP intents.

use std::path::PathBuf;

use clap::Args;
use meridian_common::crd::ClientIntents;
use meridian_gcp::{GcpConfig, PolicySynthesizer};
use tracing::info;

use crate::Result;

/// gcp-policy command arguments
#[derive(Args, Debug)]
pub struct GcpPolicyArgs {
    /// Path to a ClientIntents manifest
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Kubernetes service account the client runs as
    #[arg(long)]
    pub ksa: String,

    /// GCP project id
    #[arg(long, env = "MERIDIAN_GCP_PROJECT")]
    pub project: String,

    /// Cluster name used in service account names
    #[arg(long, env = "MERIDIAN_CLUSTER_NAME")]
    pub cluster_name: String,
}

/// Run the gcp-policy command
pub fn run(args: GcpPolicyArgs) -> Result<()> {
    let manifest = super::read_to_string(&args.file)?;
    let rendered = render(&args, &manifest)?;
    print!("{}", rendered);
    Ok(())
}

/// Render the resources for one manifest
pub fn render(args: &GcpPolicyArgs, manifest: &str) -> Result<String> {
    let intents: ClientIntents = serde_yaml::from_str(manifest)?;

    let synthesizer = PolicySynthesizer::new(GcpConfig::new(&args.project, &args.cluster_name));
    let artifacts = synthesizer.synthesize_for_client_intents(&intents, &args.ksa)?;

    info!(
        service = %intents.service_name(),
        bindings = artifacts.policy.spec.bindings.len(),
        "Rendered GCP IAM resources"
    );

    let documents = [
        serde_yaml::to_string(&artifacts.service_account)?,
        serde_yaml::to_string(&artifacts.policy_member)?,
        serde_yaml::to_string(&artifacts.policy)?,
    ];
    Ok(documents
        .iter()
        .map(|doc| format!("---\n{}", doc))
        .collect::<String>())
}
