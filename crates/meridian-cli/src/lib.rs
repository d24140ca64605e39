//! Meridian CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// Meridian - Kubernetes workload identities for cloud IAM
#[derive(Parser, Debug)]
#[command(name = "meridian")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a pod to its service identity
    ResolvePod(commands::resolve::ResolvePodArgs),
    /// Render GCP IAM resources for a ClientIntents manifest
    GcpPolicy(commands::gcp::GcpPolicyArgs),
    /// Exchange a client certificate for AWS credentials (credential_process output)
    AwsCredentials(commands::aws::AwsCredentialsArgs),
    /// Print the ClientIntents CustomResourceDefinition
    Crd,
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::ResolvePod(args) => commands::resolve::run(args).await,
            Commands::GcpPolicy(args) => commands::gcp::run(args),
            Commands::AwsCredentials(args) => commands::aws::run(args).await,
            Commands::Crd => commands::crd::run(),
        }
    }
}
