//! Type-safe configuration loader using the `config` crate,
//! with manual environment-variable overrides for core settings.

use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::env;

/// Top-level application settings loaded from `Config.toml`
/// and then overridden (where applicable) by environment variables.
///
/// Every field carries a default so the binaries run with no
/// `Config.toml` present at all.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// SQLite connection URL for the telemetry store
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// HTTP bind address for the REST API, metrics & health endpoints
    #[serde(default = "default_server_bind")]
    pub server_bind: String,

    /// Vehicle id used by `GET /api/v1/vehicle_data/` when the caller
    /// omits the `vehicle_id` query parameter
    #[serde(default = "default_vehicle_id")]
    pub default_vehicle_id: String,
}

fn default_database_url() -> String {
    // mode=rwc creates the database file on first run
    "sqlite://vehicle_data.db?mode=rwc".to_string()
}

fn default_server_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_vehicle_id() -> String {
    "f212b271-f033-444c-a445-560511f95e9c".to_string()
}

impl Settings {
    /// Load settings from `Config.toml` (if present),
    /// then apply any overrides from these environment variables:
    ///
    /// - `APP__DATABASE_URL`
    /// - `APP__SERVER_BIND`
    /// - `APP__DEFAULT_VEHICLE_ID`
    pub fn new() -> Result<Self, ConfigError> {
        // 1) Base defaults from Config.toml
        let cfg = Config::builder()
            .add_source(File::with_name("Config").required(false))
            .build()?;

        // Deserialize everything straight away
        let mut settings: Settings = cfg.try_deserialize()?;

        // 2) Manual overrides for core settings
        if let Ok(val) = env::var("APP__DATABASE_URL") {
            settings.database_url = val;
        }
        if let Ok(val) = env::var("APP__SERVER_BIND") {
            settings.server_bind = val;
        }
        if let Ok(val) = env::var("APP__DEFAULT_VEHICLE_ID") {
            settings.default_vehicle_id = val;
        }

        Ok(settings)
    }
}
