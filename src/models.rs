//! models.rs
//!
//! Data model for vehicle telemetry: the stored record, the insert payload,
//! and the small enums the query parameters parse into.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use crate::errors::TelemetryError;

/// One sample of a vehicle's state at a point in time, as stored.
///
/// `id` is assigned by the store on insert and never changes. Every
/// measurement column is independently nullable; a missing value means
/// "not recorded", which is distinct from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TelemetryRecord {
    pub id: i64,
    pub vehicle_id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub speed: Option<f64>,
    pub odometer: Option<f64>,
    pub elevation: Option<f64>,
    pub soc: Option<f64>,
    pub shift_state: Option<String>,
}

/// Insert payload for a telemetry record. Has no `id` field, so a caller
/// cannot supply one; the store assigns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTelemetryRecord {
    pub vehicle_id: String,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub odometer: Option<f64>,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub soc: Option<f64>,
    #[serde(default)]
    pub shift_state: Option<String>,
}

/// Sort direction for the `timestamp` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl FromStr for SortBy {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortBy::Asc),
            "DESC" => Ok(SortBy::Desc),
            _ => Err(TelemetryError::InvalidParam {
                name: "sort-by".into(),
                value: s.into(),
            }),
        }
    }
}

/// Download format for the export endpoint. Only these two exist and none
/// are pluggable, so callers match on the variants exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Media type for the download response.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    /// File extension used in the attachment filename.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CSV" => Ok(ExportFormat::Csv),
            "JSON" => Ok(ExportFormat::Json),
            _ => Err(TelemetryError::InvalidFormat(s.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_by_parses_both_directions() {
        assert_eq!("ASC".parse::<SortBy>().unwrap(), SortBy::Asc);
        assert_eq!("desc".parse::<SortBy>().unwrap(), SortBy::Desc);
        assert!("sideways".parse::<SortBy>().is_err());
    }

    #[test]
    fn export_format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
    }

    #[test]
    fn export_format_rejects_unknown_values() {
        let err = "xml".parse::<ExportFormat>().unwrap_err();
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn new_record_deserializes_with_missing_optional_fields() {
        let record: NewTelemetryRecord =
            serde_json::from_str(r#"{"vehicle_id": "V1", "speed": 50.0}"#).unwrap();
        assert_eq!(record.vehicle_id, "V1");
        assert_eq!(record.speed, Some(50.0));
        assert_eq!(record.timestamp, None);
        assert_eq!(record.shift_state, None);
    }
}
