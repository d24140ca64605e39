//! AWS account configuration for Roles Anywhere

use meridian_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::arn::Arn;

/// The Roles Anywhere resources one set of credentials is issued against
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsAccount {
    /// Trust anchor that issued the client certificate
    pub trust_anchor_arn: String,
    /// Roles Anywhere profile
    pub profile_arn: String,
    /// IAM role to assume
    pub role_arn: String,
}

impl AwsAccount {
    /// Create an account
    pub fn new(
        trust_anchor_arn: impl Into<String>,
        profile_arn: impl Into<String>,
        role_arn: impl Into<String>,
    ) -> Self {
        Self {
            trust_anchor_arn: trust_anchor_arn.into(),
            profile_arn: profile_arn.into(),
            role_arn: role_arn.into(),
        }
    }

    /// Region the session is created in.
    ///
    /// The trust anchor and profile must parse and agree on a region.
    pub fn region(&self) -> Result<String> {
        let trust_anchor: Arn = self.trust_anchor_arn.parse()?;
        let profile: Arn = self.profile_arn.parse()?;

        if trust_anchor.region != profile.region {
            return Err(Error::validation_for_field(
                "aws-account",
                "profileArn",
                format!(
                    "trust anchor and profile must be in the same region ({} != {})",
                    trust_anchor.region, profile.region
                ),
            ));
        }
        if trust_anchor.region.is_empty() {
            return Err(Error::validation_for_field(
                "aws-account",
                "trustAnchorArn",
                "trust anchor ARN has no region",
            ));
        }

        Ok(trust_anchor.region)
    }
}
