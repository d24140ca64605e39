//! Amazon Resource Names

use std::fmt;
use std::str::FromStr;

use meridian_common::Error;

/// A parsed ARN: `arn:<partition>:<service>:<region>:<account>:<resource>`
///
/// The resource part keeps any further `:` or `/` separators untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arn {
    /// Partition (`aws`, `aws-cn`, `aws-us-gov`)
    pub partition: String,
    /// Service namespace (e.g. `rolesanywhere`, `iam`)
    pub service: String,
    /// Region; empty for global services such as IAM
    pub region: String,
    /// Account id
    pub account_id: String,
    /// Service-specific resource
    pub resource: String,
}

impl FromStr for Arn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| Error::validation_for("arn", format!("{}: {}", message, s));

        let mut parts = s.splitn(6, ':');
        if parts.next() != Some("arn") {
            return Err(invalid("ARN must start with 'arn:'"));
        }

        let mut next = || parts.next().ok_or_else(|| invalid("not enough sections in ARN"));
        let partition = next()?.to_string();
        let service = next()?.to_string();
        let region = next()?.to_string();
        let account_id = next()?.to_string();
        let resource = next()?.to_string();

        if partition.is_empty() {
            return Err(invalid("ARN has an empty partition"));
        }
        if service.is_empty() {
            return Err(invalid("ARN has an empty service"));
        }

        Ok(Self {
            partition,
            service,
            region,
            account_id,
            resource,
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trust_anchor() {
        let arn: Arn = "arn:aws:rolesanywhere:us-west-2:123456789012:trust-anchor/4579ef5c"
            .parse()
            .unwrap();
        assert_eq!(arn.partition, "aws");
        assert_eq!(arn.service, "rolesanywhere");
        assert_eq!(arn.region, "us-west-2");
        assert_eq!(arn.account_id, "123456789012");
        assert_eq!(arn.resource, "trust-anchor/4579ef5c");
    }

    #[test]
    fn test_resource_keeps_colons() {
        let arn: Arn = "arn:aws:logs:us-east-1:123:log-group:app:*".parse().unwrap();
        assert_eq!(arn.resource, "log-group:app:*");
        assert_eq!(arn.to_string(), "arn:aws:logs:us-east-1:123:log-group:app:*");
    }

    #[test]
    fn test_global_service_has_empty_region() {
        let arn: Arn = "arn:aws:iam::123456789012:role/checkout".parse().unwrap();
        assert!(arn.region.is_empty());
    }

    #[test]
    fn test_invalid_arns() {
        for bad in [
            "",
            "not-an-arn",
            "arn:aws:rolesanywhere:us-west-2",
            "arn::rolesanywhere:us-west-2:123:x",
            "arn:aws::us-west-2:123:x",
        ] {
            let err = bad.parse::<Arn>().unwrap_err();
            assert!(err.is_validation(), "{bad}");
        }
    }
}
