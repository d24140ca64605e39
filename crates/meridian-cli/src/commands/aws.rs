//! aws-credentials command - AWS `credential_process` helper
//!
//! Exchanges a client certificate for temporary credentials and prints them
//! in the format AWS SDKs read from a `credential_process` command.
//!
//! # Usage in ~/.aws/config
//!
//! ```ini
//! [profile checkout]
//! credential_process = meridian aws-credentials --cert /var/run/meridian/cert.pem --key /var/run/meridian/key.pem
//! ```
//!
//! The ARNs come from `MERIDIAN_AWS_*` environment variables when not passed
//! as flags.

use std::path::PathBuf;

use clap::Args;
use meridian_aws::{AwsAccount, CredentialExchanger, ExchangerConfig};

use crate::Result;

/// aws-credentials command arguments
#[derive(Args, Debug)]
pub struct AwsCredentialsArgs {
    /// PEM file with the client certificate
    #[arg(long, env = "MERIDIAN_AWS_CERT")]
    pub cert: PathBuf,

    /// PEM file with the certificate's EC private key
    #[arg(long, env = "MERIDIAN_AWS_KEY")]
    pub key: PathBuf,

    /// Roles Anywhere trust anchor ARN
    #[arg(long, env = "MERIDIAN_AWS_TRUST_ANCHOR_ARN")]
    pub trust_anchor_arn: String,

    /// Roles Anywhere profile ARN
    #[arg(long, env = "MERIDIAN_AWS_PROFILE_ARN")]
    pub profile_arn: String,

    /// IAM role ARN to assume
    #[arg(long, env = "MERIDIAN_AWS_ROLE_ARN")]
    pub role_arn: String,

    /// Override the Roles Anywhere endpoint (e.g. for a VPC endpoint)
    #[arg(long, env = "MERIDIAN_AWS_ROLES_ANYWHERE_ENDPOINT")]
    pub endpoint: Option<String>,
}

impl AwsCredentialsArgs {
    /// Account from the arguments
    pub fn account(&self) -> AwsAccount {
        AwsAccount::new(&self.trust_anchor_arn, &self.profile_arn, &self.role_arn)
    }

    /// Exchanger configuration from the arguments
    pub fn exchanger_config(&self) -> ExchangerConfig {
        ExchangerConfig {
            endpoint_override: self.endpoint.clone(),
            ..Default::default()
        }
    }
}

/// Run the aws-credentials command
pub async fn run(args: AwsCredentialsArgs) -> Result<()> {
    let exchanger = CredentialExchanger::new(args.exchanger_config())?;
    let credentials = exchanger
        .exchange(&args.cert, &args.key, &args.account())
        .await?;

    // Print to stdout (the AWS SDK reads this)
    println!("{}", credentials.to_credential_process_json()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: AwsCredentialsArgs,
    }

    #[test]
    fn test_args_to_account_and_config() {
        let args = TestCli::try_parse_from([
            "test",
            "--cert",
            "cert.pem",
            "--key",
            "key.pem",
            "--trust-anchor-arn",
            "arn:aws:rolesanywhere:us-west-2:1:trust-anchor/ta",
            "--profile-arn",
            "arn:aws:rolesanywhere:us-west-2:1:profile/p",
            "--role-arn",
            "arn:aws:iam::1:role/r",
            "--endpoint",
            "https://vpce.example.com",
        ])
        .unwrap()
        .args;

        let account = args.account();
        assert_eq!(account.region().unwrap(), "us-west-2");
        assert_eq!(account.role_arn, "arn:aws:iam::1:role/r");

        let config = args.exchanger_config();
        assert_eq!(
            config.endpoint_override.as_deref(),
            Some("https://vpce.example.com")
        );
        assert_eq!(config.request_timeout, ExchangerConfig::default().request_timeout);
    }
}
