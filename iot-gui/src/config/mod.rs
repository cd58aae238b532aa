use std::path::PathBuf;
use std::time::Duration;

use iot_sdk::SdkConfig;
use secrecy::Secret;
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub sdk: SdkSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Generated at startup when empty.
    #[serde(default)]
    pub instance_id: String,
    /// Static assets, relative to the crate directory unless absolute.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Key for signing the post-refresh redirect target.
    pub referer_secret: Secret<String>,
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_static_dir() -> String {
    "static".to_string()
}

/// Where the platform services live. Every service URL is `base_url:port`.
#[derive(Deserialize, Clone)]
pub struct SdkSettings {
    pub base_url: String,
    #[serde(default = "default_users_port")]
    pub users_port: u16,
    #[serde(default = "default_things_port")]
    pub things_port: u16,
    #[serde(default = "default_http_adapter_port")]
    pub http_adapter_port: u16,
    #[serde(default = "default_reader_port")]
    pub reader_port: u16,
    #[serde(default = "default_bootstrap_port")]
    pub bootstrap_port: u16,
    #[serde(default = "default_certs_port")]
    pub certs_port: u16,
    /// Public address of this UI, used in password reset links.
    pub host_url: String,
    #[serde(default = "default_msg_content_type")]
    pub msg_content_type: String,
    #[serde(default)]
    pub tls_verification: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_users_port() -> u16 {
    9002
}

fn default_things_port() -> u16 {
    9000
}

fn default_http_adapter_port() -> u16 {
    8008
}

fn default_reader_port() -> u16 {
    9011
}

fn default_bootstrap_port() -> u16 {
    9013
}

fn default_certs_port() -> u16 {
    9019
}

fn default_msg_content_type() -> String {
    iot_sdk::CT_SENML_JSON.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl SdkSettings {
    pub fn sdk_config(&self) -> SdkConfig {
        let base = self.base_url.trim_end_matches('/');
        let at = |port: u16| format!("{base}:{port}");
        SdkConfig {
            users_url: at(self.users_port),
            things_url: at(self.things_port),
            http_adapter_url: at(self.http_adapter_port),
            reader_url: at(self.reader_port),
            bootstrap_url: at(self.bootstrap_port),
            certs_url: at(self.certs_port),
            host_url: self.host_url.clone(),
            msg_content_type: self.msg_content_type.clone(),
            tls_verification: self.tls_verification,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector; traces are only exported when set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The `iot-gui` crate directory, whether started from it or from the
/// workspace root.
pub fn crate_directory() -> Result<PathBuf, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    if base_path.ends_with("iot-gui") {
        Ok(base_path)
    } else {
        Ok(base_path.join("iot-gui"))
    }
}

impl Settings {
    pub fn static_path(&self) -> Result<PathBuf, config::ConfigError> {
        let dir = PathBuf::from(&self.server.static_dir);
        if dir.is_absolute() {
            return Ok(dir);
        }
        Ok(crate_directory()?.join(dir))
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let configuration_directory = crate_directory()?.join("config");

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_urls_join_base_and_port() {
        let settings = SdkSettings {
            base_url: "http://platform/".into(),
            users_port: 1,
            things_port: 2,
            http_adapter_port: 3,
            reader_port: 4,
            bootstrap_port: 5,
            certs_port: 6,
            host_url: "http://ui".into(),
            msg_content_type: default_msg_content_type(),
            tls_verification: true,
            timeout_secs: 5,
        };

        let cfg = settings.sdk_config();
        assert_eq!(cfg.users_url, "http://platform:1");
        assert_eq!(cfg.things_url, "http://platform:2");
        assert_eq!(cfg.certs_url, "http://platform:6");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert!(cfg.tls_verification);
    }
}
