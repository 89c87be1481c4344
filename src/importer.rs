//! importer.rs
//!
//! Bulk CSV loading. The file's basename (without extension) becomes the
//! `vehicle_id` for every row; the literal string `NULL` in any column
//! means the value is absent. One inserted record per row.

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::errors::TelemetryError;
use crate::metrics::IMPORT_COUNTER;
use crate::models::NewTelemetryRecord;
use crate::service::VehicleDataService;

/// Timestamp layout used by the telemetry dumps, fractional seconds
/// optional: `2020-05-08 18:01:33.591000`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const NULL_SENTINEL: &str = "NULL";

/// One raw CSV row as it appears in the dump files. Everything is a
/// string until the sentinel check has run.
#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    speed: String,
    odometer: String,
    soc: String,
    elevation: String,
    shift_state: String,
}

/// Derive the vehicle id from the CSV file path: basename, extension
/// stripped.
pub fn vehicle_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parse_optional_timestamp(raw: &str) -> Result<Option<NaiveDateTime>, TelemetryError> {
    if raw == NULL_SENTINEL {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(Some)
        .map_err(|_| TelemetryError::InvalidParam {
            name: "timestamp".into(),
            value: raw.into(),
        })
}

fn parse_optional_float(name: &str, raw: &str) -> Result<Option<f64>, TelemetryError> {
    if raw == NULL_SENTINEL {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| TelemetryError::InvalidParam {
            name: name.into(),
            value: raw.into(),
        })
}

fn row_to_record(vehicle_id: &str, row: &CsvRow) -> Result<NewTelemetryRecord, TelemetryError> {
    Ok(NewTelemetryRecord {
        vehicle_id: vehicle_id.to_string(),
        timestamp: parse_optional_timestamp(&row.timestamp)?,
        speed: parse_optional_float("speed", &row.speed)?,
        odometer: parse_optional_float("odometer", &row.odometer)?,
        soc: parse_optional_float("soc", &row.soc)?,
        elevation: parse_optional_float("elevation", &row.elevation)?,
        shift_state: if row.shift_state == NULL_SENTINEL {
            None
        } else {
            Some(row.shift_state.clone())
        },
    })
}

/// Import every row of one CSV file, returning the number of records
/// inserted. A malformed row aborts the file; rows already inserted stay.
pub async fn import_file(
    service: &VehicleDataService,
    path: &Path,
) -> Result<u64, TelemetryError> {
    let vehicle_id = vehicle_id_from_path(path);
    let mut reader = csv::Reader::from_path(path)?;

    let mut count = 0u64;
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        let record = row_to_record(&vehicle_id, &row)?;
        service.add_vehicle_data(&record).await?;
        IMPORT_COUNTER.inc();
        count += 1;
    }

    debug!(vehicle_id = %vehicle_id, count, "Imported CSV file");
    Ok(count)
}
