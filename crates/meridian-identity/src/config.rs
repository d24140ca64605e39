//! Resolver configuration

/// Settings that change how pods map to service names.
///
/// Supplied by the caller at construction; never read from the
/// environment at resolution time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Pod annotation whose value, when non-empty, is used as the service name
    pub service_name_override_annotation: Option<String>,

    /// Name Job-owned pods after their first container image instead of the Job
    pub use_image_name_for_jobs: bool,
}

impl ResolverConfig {
    /// Set the override annotation key
    pub fn with_override_annotation(mut self, key: impl Into<String>) -> Self {
        self.service_name_override_annotation = Some(key.into());
        self
    }

    /// Enable or disable image naming for Jobs
    pub fn with_image_name_for_jobs(mut self, enabled: bool) -> Self {
        self.use_image_name_for_jobs = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_override_and_flag_off() {
        let config = ResolverConfig::default();
        assert!(config.service_name_override_annotation.is_none());
        assert!(!config.use_image_name_for_jobs);
    }

    #[test]
    fn test_builders() {
        let config = ResolverConfig::default()
            .with_override_annotation("meridian.dev/service-name")
            .with_image_name_for_jobs(true);
        assert_eq!(
            config.service_name_override_annotation.as_deref(),
            Some("meridian.dev/service-name")
        );
        assert!(config.use_image_name_for_jobs);
    }
}
