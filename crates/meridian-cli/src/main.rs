//! Meridian CLI
//!
//! Resolves workload identities and renders cloud IAM artifacts.

use clap::Parser;

use meridian_cli::{Cli, Result};
use meridian_common::telemetry::{init_telemetry, LogTarget, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Install the crypto provider before any TLS client is built
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    // Every subcommand writes a document to stdout
    let _telemetry = init_telemetry(TelemetryConfig {
        service_name: "meridian-cli".to_string(),
        target: LogTarget::Stderr,
        ..Default::default()
    })?;

    cli.run().await
}
