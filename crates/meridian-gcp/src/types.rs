//! Config Connector IAM resource types
//!
//! Plain serde mirrors of the `iam.cnrm.cloud.google.com/v1beta1` resources
//! Meridian emits. Only the fields Meridian sets are modelled.

use meridian_common::resource::{HasApiResource, ObjectMeta};
use serde::{Deserialize, Serialize};

/// Config Connector IAM API version
pub const CNRM_IAM_API_VERSION: &str = "iam.cnrm.cloud.google.com/v1beta1";

/// Reference to the GCP resource a policy or member applies to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    /// Referenced kind (e.g. "Project", "IAMServiceAccount")
    pub kind: String,
    /// External identifier (project id, service account email)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<String>,
    /// Name of an in-cluster Config Connector object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ResourceRef {
    /// Reference a GCP project by id
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            kind: "Project".to_string(),
            external: Some(project_id.into()),
            name: None,
        }
    }

    /// Reference an in-cluster IAMServiceAccount by object name
    pub fn service_account(name: impl Into<String>) -> Self {
        Self {
            kind: IamServiceAccount::KIND.to_string(),
            external: None,
            name: Some(name.into()),
        }
    }
}

// =============================================================================
// IAMPartialPolicy
// =============================================================================

/// Config Connector IAMPartialPolicy: bindings merged into the resource's
/// existing IAM policy instead of replacing it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IamPartialPolicy {
    /// API version
    #[serde(default = "IamPartialPolicy::api_version")]
    pub api_version: String,
    /// Kind
    #[serde(default = "IamPartialPolicy::kind")]
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: IamPartialPolicySpec,
}

impl HasApiResource for IamPartialPolicy {
    const API_VERSION: &'static str = CNRM_IAM_API_VERSION;
    const KIND: &'static str = "IAMPartialPolicy";
    const PLURAL: &'static str = "iampartialpolicies";
}

impl IamPartialPolicy {
    fn api_version() -> String {
        <Self as HasApiResource>::API_VERSION.to_string()
    }
    fn kind() -> String {
        <Self as HasApiResource>::KIND.to_string()
    }

    /// Create a new IAMPartialPolicy
    pub fn new(metadata: ObjectMeta, spec: IamPartialPolicySpec) -> Self {
        Self {
            api_version: Self::api_version(),
            kind: Self::kind(),
            metadata,
            spec,
        }
    }
}

/// IAMPartialPolicy spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IamPartialPolicySpec {
    /// Resource the bindings apply to
    pub resource_ref: ResourceRef,
    /// Bindings, in intent order
    #[serde(default)]
    pub bindings: Vec<IamPartialPolicyBinding>,
}

/// One role grant with its members and optional condition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IamPartialPolicyBinding {
    /// Role (e.g. "roles/storage.objectViewer")
    pub role: String,
    /// Members granted the role
    pub members: Vec<IamMember>,
    /// CEL condition restricting the grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<IamCondition>,
}

/// Binding member
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IamMember {
    /// Member string (e.g. "serviceAccount:sa@project.iam.gserviceaccount.com")
    pub member: String,
}

/// IAM condition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IamCondition {
    /// Condition title
    pub title: String,
    /// CEL expression
    pub expression: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// IAMServiceAccount
// =============================================================================

/// Config Connector IAMServiceAccount
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IamServiceAccount {
    /// API version
    #[serde(default = "IamServiceAccount::api_version")]
    pub api_version: String,
    /// Kind
    #[serde(default = "IamServiceAccount::kind")]
    pub kind: String,
    /// Metadata; the object name is the service account id
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: IamServiceAccountSpec,
}

impl HasApiResource for IamServiceAccount {
    const API_VERSION: &'static str = CNRM_IAM_API_VERSION;
    const KIND: &'static str = "IAMServiceAccount";
    const PLURAL: &'static str = "iamserviceaccounts";
}

impl IamServiceAccount {
    fn api_version() -> String {
        <Self as HasApiResource>::API_VERSION.to_string()
    }
    fn kind() -> String {
        <Self as HasApiResource>::KIND.to_string()
    }

    /// Create a new IAMServiceAccount
    pub fn new(metadata: ObjectMeta, display_name: impl Into<String>) -> Self {
        Self {
            api_version: Self::api_version(),
            kind: Self::kind(),
            metadata,
            spec: IamServiceAccountSpec {
                display_name: display_name.into(),
            },
        }
    }
}

/// IAMServiceAccount spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IamServiceAccountSpec {
    /// Human-readable name shown in the console
    pub display_name: String,
}

// =============================================================================
// IAMPolicyMember
// =============================================================================

/// Config Connector IAMPolicyMember: a single (member, role) grant
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IamPolicyMember {
    /// API version
    #[serde(default = "IamPolicyMember::api_version")]
    pub api_version: String,
    /// Kind
    #[serde(default = "IamPolicyMember::kind")]
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: IamPolicyMemberSpec,
}

impl HasApiResource for IamPolicyMember {
    const API_VERSION: &'static str = CNRM_IAM_API_VERSION;
    const KIND: &'static str = "IAMPolicyMember";
    const PLURAL: &'static str = "iampolicymembers";
}

impl IamPolicyMember {
    fn api_version() -> String {
        <Self as HasApiResource>::API_VERSION.to_string()
    }
    fn kind() -> String {
        <Self as HasApiResource>::KIND.to_string()
    }

    /// Create a new IAMPolicyMember
    pub fn new(metadata: ObjectMeta, spec: IamPolicyMemberSpec) -> Self {
        Self {
            api_version: Self::api_version(),
            kind: Self::kind(),
            metadata,
            spec,
        }
    }
}

/// IAMPolicyMember spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IamPolicyMemberSpec {
    /// Member receiving the role
    pub member: String,
    /// Role granted
    pub role: String,
    /// Resource the grant applies to
    pub resource_ref: ResourceRef,
}
