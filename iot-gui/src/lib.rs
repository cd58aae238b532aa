pub mod config;
pub mod decode;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod services;
pub mod startup;
pub mod utils;

use iot_sdk::{
    ChannelClient, GroupClient, HealthClient, MessageClient, PolicyClient, Sdk, ThingClient,
    UserClient,
};
use std::sync::Arc;
use utils::crypto::RefererSigner;

/// Shared application state: one backend capability per resource, all served
/// by the same `Sdk`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserClient>,
    pub things: Arc<dyn ThingClient>,
    pub channels: Arc<dyn ChannelClient>,
    pub groups: Arc<dyn GroupClient>,
    pub policies: Arc<dyn PolicyClient>,
    pub messages: Arc<dyn MessageClient>,
    pub health: Arc<dyn HealthClient>,
    pub signer: RefererSigner,
    pub instance_id: String,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        sdk: Arc<Sdk>,
        signer: RefererSigner,
        instance_id: String,
        secure_cookies: bool,
    ) -> Self {
        Self {
            users: sdk.clone(),
            things: sdk.clone(),
            channels: sdk.clone(),
            groups: sdk.clone(),
            policies: sdk.clone(),
            messages: sdk.clone(),
            health: sdk,
            signer,
            instance_id,
            secure_cookies,
        }
    }
}
