use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::error::AppError;
use std::path::{Path, PathBuf};

const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub session: SessionSettings,
    pub rate_limit: RateLimitSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Mark the session cookie `Secure`. Off only for local HTTP.
    pub secure_cookies: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Key rate limits on `x-forwarded-for` instead of the peer address.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    /// Without a URL the service runs on the in-memory store.
    pub url: Option<Secret<String>>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Deserialize, Clone)]
pub struct SessionSettings {
    pub secret: Secret<String>,
    pub ttl_hours: i64,
}

#[derive(Deserialize, Clone)]
pub struct RateLimitSettings {
    pub signin_attempts: u32,
    pub signin_window_seconds: u64,
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl Settings {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.session.secret.expose_secret().len() < MIN_SESSION_SECRET_LEN {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "session.secret must be at least {} bytes",
                MIN_SESSION_SECRET_LEN
            )));
        }
        if self.session.ttl_hours <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "session.ttl_hours must be positive"
            )));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "database.min_connections exceeds max_connections"
            )));
        }
        Ok(())
    }
}

fn configuration_directory() -> Result<PathBuf, AppError> {
    let base_path = std::env::current_dir()?;

    // Running from the workspace root or from the crate directory.
    if base_path.ends_with("portal-service") {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join("portal-service").join("config"))
    }
}

/// `base.yaml` from `directory`, overlaid by `APP_` environment variables
/// (`APP_SESSION__SECRET`, `APP_SERVER__PORT`, ...).
pub fn load(directory: &Path) -> Result<Settings, AppError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

pub fn get_configuration() -> Result<Settings, AppError> {
    load(&configuration_directory()?)
}
