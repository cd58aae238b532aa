use dotenvy::dotenv;
use iot_gui::config::get_configuration;
use iot_gui::startup::build_router;
use iot_gui::utils::{crypto::RefererSigner, init_tracing};
use iot_gui::AppState;
use iot_sdk::Sdk;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "iot-gui",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )
    .map_err(|e| anyhow::anyhow!("Tracing setup failed: {}", e))?;

    iot_gui::services::metrics::init_metrics()?;

    let instance_id = match configuration.server.instance_id.as_str() {
        "" => Uuid::new_v4().to_string(),
        id => id.to_string(),
    };

    let sdk = Arc::new(Sdk::new(configuration.sdk.sdk_config())?);
    let signer = RefererSigner::new(configuration.server.referer_secret.clone())?;
    let state = AppState::new(
        sdk,
        signer,
        instance_id.clone(),
        configuration.server.secure_cookies,
    );

    let app = build_router(state, configuration.static_path()?);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!(instance_id = %instance_id, "Starting iot-gui on {}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            anyhow::anyhow!("Server error: {}", e)
        })?;

    info!("iot-gui stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
