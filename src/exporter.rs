//! exporter.rs
//!
//! Renders a sequence of telemetry records into CSV text or a JSON array
//! for download responses. Pure: computes output text only, never touches
//! the store or mutates its input.

use serde_json::Value;

use crate::errors::TelemetryError;
use crate::models::{ExportFormat, TelemetryRecord};

/// Fixed CSV column set, in output order. The `id` column is deliberately
/// absent; ids travel only in the JSON representation.
const CSV_COLUMNS: [&str; 7] = [
    "vehicle_id",
    "timestamp",
    "speed",
    "odometer",
    "elevation",
    "soc",
    "shift_state",
];

/// Render `records` in the requested format, preserving input order.
pub fn export(records: &[TelemetryRecord], format: ExportFormat) -> Result<String, TelemetryError> {
    match format {
        ExportFormat::Csv => export_csv(records),
        ExportFormat::Json => export_json(records),
    }
}

/// CSV: fixed header row, one row per record, `\n` line termination.
///
/// Each cell carries the field's JSON textual form (timestamps as
/// ISO-8601, floats as JSON numbers); null fields become empty cells, so
/// every row always has all seven columns.
fn export_csv(records: &[TelemetryRecord]) -> Result<String, TelemetryError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS)?;

    for record in records {
        let value = serde_json::to_value(record)?;
        let row: Vec<String> = CSV_COLUMNS
            .iter()
            .map(|column| cell_text(&value[*column]))
            .collect();
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TelemetryError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        TelemetryError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// JSON: an array of record objects, ids included, in input order.
fn export_json(records: &[TelemetryRecord]) -> Result<String, TelemetryError> {
    Ok(serde_json::to_string(records)?)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
