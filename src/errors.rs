//! Centralised error type for the telemetry service.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Vehicle data with id {0} not found")]
    NotFound(i64),

    #[error("Invalid export format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for parameter {name}: {value}")]
    InvalidParam { name: String, value: String },

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
