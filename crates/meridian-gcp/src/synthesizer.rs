//! Intent -> IAM policy synthesis
//!
//! Each (intent, permission) pair becomes one conditional binding granted to
//! the client's Google service account at project scope. The condition pins
//! the grant to the intent's target resource:
//!
//! | Target name          | Condition expression                              |
//! |----------------------|---------------------------------------------------|
//! | `buckets/receipts`   | `resource.name == "buckets/receipts"`             |
//! | `buckets/receipts-*` | `resource.name.startsWith("buckets/receipts-")`   |
//!
//! Any invalid intent fails the whole call; no partial policy is returned.

use meridian_common::crd::{
    formatted_identity, ClientIntents, Intent, IntentType, CLIENT_LABEL_KEY,
};
use meridian_common::resource::ObjectMeta;
use meridian_common::{Error, Result, NAME_PREFIX};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::GcpConfig;
use crate::names::GcpNames;
use crate::types::{
    IamCondition, IamMember, IamPartialPolicy, IamPartialPolicyBinding, IamPartialPolicySpec,
    IamPolicyMember, IamPolicyMemberSpec, IamServiceAccount, ResourceRef,
};

/// Error context for synthesis validation failures
const CONTEXT: &str = "gcp-policy";

/// Role that lets a Kubernetes service account act as a Google service account
pub const WORKLOAD_IDENTITY_USER_ROLE: &str = "roles/iam.workloadIdentityUser";

/// Permission prefixes that already name a full role
const FULL_ROLE_PREFIXES: &[&str] = &["roles/", "projects/", "organizations/"];

/// Everything needed to give one client service its GCP access
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpArtifacts {
    /// Google service account for the client
    pub service_account: IamServiceAccount,
    /// Workload identity grant from the Kubernetes service account
    pub policy_member: IamPolicyMember,
    /// Conditional bindings for the client's intents
    pub policy: IamPartialPolicy,
}

/// Builds Config Connector IAM resources for one project and cluster
#[derive(Clone, Debug)]
pub struct PolicySynthesizer {
    config: GcpConfig,
}

impl PolicySynthesizer {
    /// Create a synthesizer
    pub fn new(config: GcpConfig) -> Self {
        Self { config }
    }

    /// Name derivation for this synthesizer's project and cluster
    pub fn names(&self) -> GcpNames<'_> {
        GcpNames::new(&self.config)
    }

    /// Build the IAMPartialPolicy for a client service's intents.
    ///
    /// `ksa_name` is the Kubernetes service account the client runs as;
    /// it selects the Google service account that receives the grants.
    pub fn synthesize(
        &self,
        namespace: &str,
        client_service_name: &str,
        ksa_name: &str,
        intents: &[Intent],
    ) -> Result<IamPartialPolicy> {
        let names = self.names();
        let member = names.service_account_member(namespace, ksa_name);

        let mut bindings = Vec::new();
        for (index, intent) in intents.iter().enumerate() {
            let condition = build_condition(intent, index)?;
            for permission in &intent.permissions {
                bindings.push(IamPartialPolicyBinding {
                    role: role_for_permission(permission),
                    members: vec![IamMember {
                        member: member.clone(),
                    }],
                    condition: Some(condition.clone()),
                });
            }
        }

        debug!(
            namespace = %namespace,
            service = %client_service_name,
            intents = intents.len(),
            bindings = bindings.len(),
            "Synthesized GCP intent policy"
        );

        Ok(IamPartialPolicy::new(
            ObjectMeta::new(
                names.intent_policy_name(namespace, client_service_name),
                namespace,
            )
            .with_label(
                CLIENT_LABEL_KEY,
                formatted_identity(client_service_name, namespace),
            ),
            IamPartialPolicySpec {
                resource_ref: ResourceRef::project(&self.config.project_id),
                bindings,
            },
        ))
    }

    /// Google service account for a Kubernetes service account
    pub fn service_account(&self, namespace: &str, ksa_name: &str) -> IamServiceAccount {
        let names = self.names();
        IamServiceAccount::new(
            ObjectMeta::new(names.service_account_name(namespace, ksa_name), namespace),
            names.service_account_display_name(namespace, ksa_name),
        )
    }

    /// Workload identity binding letting the Kubernetes service account
    /// impersonate its Google service account
    pub fn workload_identity_member(&self, namespace: &str, ksa_name: &str) -> IamPolicyMember {
        let names = self.names();
        IamPolicyMember::new(
            ObjectMeta::new(names.workload_identity_policy_name(ksa_name), namespace),
            IamPolicyMemberSpec {
                member: names.workload_identity_member(namespace, ksa_name),
                role: WORKLOAD_IDENTITY_USER_ROLE.to_string(),
                resource_ref: ResourceRef::service_account(
                    names.service_account_name(namespace, ksa_name),
                ),
            },
        )
    }

    /// All GCP resources for the GCP intents of a ClientIntents
    pub fn synthesize_for_client_intents(
        &self,
        intents: &ClientIntents,
        ksa_name: &str,
    ) -> Result<GcpArtifacts> {
        let namespace = intents.metadata.namespace.as_deref().ok_or_else(|| {
            Error::validation_for_field(
                CONTEXT,
                "metadata.namespace",
                "ClientIntents has no namespace",
            )
        })?;
        let gcp_intents = intents.intents_of_type(IntentType::Gcp);

        Ok(GcpArtifacts {
            service_account: self.service_account(namespace, ksa_name),
            policy_member: self.workload_identity_member(namespace, ksa_name),
            policy: self.synthesize(namespace, intents.service_name(), ksa_name, &gcp_intents)?,
        })
    }
}

/// Map a permission to a role path; bare names become predefined roles
pub fn role_for_permission(permission: &str) -> String {
    if FULL_ROLE_PREFIXES
        .iter()
        .any(|prefix| permission.starts_with(prefix))
    {
        permission.to_string()
    } else {
        format!("roles/{}", permission)
    }
}

/// CEL condition restricting a grant to the intent's target
fn build_condition(intent: &Intent, index: usize) -> Result<IamCondition> {
    let name = &intent.name;
    let field = || format!("spec.calls[{}].name", index);

    if name.contains('"') || name.contains('\\') {
        return Err(Error::validation_for_field(
            CONTEXT,
            field(),
            format!("target name must not contain quotes or backslashes: {}", name),
        ));
    }

    let expression = match name.find('*') {
        None => format!("resource.name == \"{}\"", name),
        Some(position) if position == name.len() - 1 => {
            let prefix = &name[..position];
            trace!(target_name = %name, prefix = %prefix, "Building wildcard condition");
            format!("resource.name.startsWith(\"{}\")", prefix)
        }
        Some(_) => {
            return Err(Error::validation_for_field(
                CONTEXT,
                field(),
                format!("wildcard is only supported as the last character: {}", name),
            ))
        }
    };

    Ok(IamCondition {
        title: format!("{}-{}", NAME_PREFIX, name),
        expression,
        description: None,
    })
}
