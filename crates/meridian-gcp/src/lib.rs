//! GCP IAM synthesis for Meridian
//!
//! Turns a client service's GCP intents into Config Connector resources:
//!
//! - `IAMPartialPolicy`: one conditional binding per (intent, permission),
//!   granted to the service's Google service account at project scope
//! - `IAMServiceAccount`: the Google service account itself
//! - `IAMPolicyMember`: lets the Kubernetes service account impersonate it
//!   through workload identity

#![deny(missing_docs)]

pub mod config;
pub mod names;
pub mod synthesizer;
pub mod types;

pub use config::GcpConfig;
pub use names::GcpNames;
pub use synthesizer::{GcpArtifacts, PolicySynthesizer};
pub use types::{
    IamCondition, IamMember, IamPartialPolicy, IamPartialPolicyBinding, IamPartialPolicySpec,
    IamPolicyMember, IamPolicyMemberSpec, IamServiceAccount, IamServiceAccountSpec, ResourceRef,
};
