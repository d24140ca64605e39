//! Custom Resource Definitions consumed by Meridian

mod client_intents;

pub use client_intents::{
    formatted_identity, ClientIntents, ClientIntentsSpec, Intent, IntentType, Service,
    CLIENT_LABEL_KEY,
};
