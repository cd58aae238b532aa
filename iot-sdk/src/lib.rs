//! Typed async client for the IoT platform REST API.
//!
//! Operations are grouped by resource into capability traits; [`Sdk`]
//! implements all of them.

pub mod bootstrap;
pub mod certs;
pub mod channels;
pub mod client;
pub mod error;
pub mod groups;
pub mod health;
pub mod messages;
pub mod models;
pub mod page;
pub mod policies;
pub mod subscriptions;
pub mod things;
pub mod users;

pub use bootstrap::BootstrapClient;
pub use certs::CertClient;
pub use channels::ChannelClient;
pub use client::{
    authorization, thing_token, Sdk, SdkConfig, BEARER_PREFIX, CT_BINARY, CT_JSON, CT_SENML_JSON,
    THING_PREFIX,
};
pub use error::{Error, ErrorKind};
pub use groups::GroupClient;
pub use health::HealthClient;
pub use messages::MessageClient;
pub use models::*;
pub use page::{Page, PageMetadata};
pub use policies::PolicyClient;
pub use subscriptions::SubscriptionClient;
pub use things::ThingClient;
pub use users::UserClient;
