//! service.rs
//!
//! Data access for vehicle telemetry: filtered/sorted/paginated reads,
//! point lookup, insert, and the bulk administrative delete used by the
//! CSV importer.

use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use std::time::Instant;
use tracing::debug;

use crate::errors::TelemetryError;
use crate::metrics::{INSERT_COUNTER, QUERY_HISTOGRAM};
use crate::models::{NewTelemetryRecord, SortBy, TelemetryRecord};

/// Result-count cap applied when the caller gives no `limit`.
///
/// This is the one canonical default; the API surface documents the same
/// value.
pub const DEFAULT_LIMIT: i64 = 3;

const SELECT_COLUMNS: &str =
    "SELECT id, vehicle_id, timestamp, speed, odometer, elevation, soc, shift_state \
     FROM vehicle_data";

/// Filter/sort/pagination parameters for one telemetry read.
///
/// `vehicle_id` is the only required filter. Timestamp bounds are
/// inclusive and applied independently when present. `skip` discards that
/// many leading rows of the sorted result before `limit` caps it.
#[derive(Debug, Clone)]
pub struct VehicleDataQuery {
    pub vehicle_id: String,
    pub initial_timestamp: Option<NaiveDateTime>,
    pub final_timestamp: Option<NaiveDateTime>,
    pub sort_by: Option<SortBy>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl VehicleDataQuery {
    /// A query with only the vehicle filter set.
    pub fn for_vehicle(vehicle_id: impl Into<String>) -> Self {
        VehicleDataQuery {
            vehicle_id: vehicle_id.into(),
            initial_timestamp: None,
            final_timestamp: None,
            sort_by: None,
            limit: None,
            skip: None,
        }
    }
}

/// Compose the SELECT for a [`VehicleDataQuery`].
///
/// Clause order is fixed and significant: vehicle filter, then timestamp
/// bounds, then ORDER BY, then LIMIT/OFFSET. Skip and limit always apply
/// to the post-sort sequence. Without `sort_by` no ORDER BY is emitted
/// and SQLite returns insertion (rowid) order.
fn build_query_sql(query: &VehicleDataQuery) -> String {
    let mut sql = format!("{SELECT_COLUMNS} WHERE vehicle_id = ?");

    if query.initial_timestamp.is_some() {
        sql.push_str(" AND timestamp >= ?");
    }
    if query.final_timestamp.is_some() {
        sql.push_str(" AND timestamp <= ?");
    }

    match query.sort_by {
        Some(SortBy::Asc) => sql.push_str(" ORDER BY timestamp ASC"),
        Some(SortBy::Desc) => sql.push_str(" ORDER BY timestamp DESC"),
        None => {}
    }

    sql.push_str(" LIMIT ? OFFSET ?");
    sql
}

/// Data-access layer over the `vehicle_data` table.
///
/// Owns nothing but a pool handle; constructed once at startup and shared
/// between requests. Every operation checks a connection out of the pool
/// for the duration of its statement and releases it on all exit paths.
#[derive(Debug, Clone)]
pub struct VehicleDataService {
    pool: SqlitePool,
}

impl VehicleDataService {
    pub fn new(pool: SqlitePool) -> Self {
        VehicleDataService { pool }
    }

    /// Retrieve the records matching `query`, in the requested order,
    /// bounded by skip/limit.
    ///
    /// An unmatched `vehicle_id` yields an empty Vec, not an error. So do
    /// inverted bounds (`initial_timestamp > final_timestamp`), since no row
    /// can satisfy both.
    pub async fn get_vehicle_data(
        &self,
        query: &VehicleDataQuery,
    ) -> Result<Vec<TelemetryRecord>, TelemetryError> {
        let sql = build_query_sql(query);
        debug!(vehicle_id = %query.vehicle_id, sql = %sql, "Querying vehicle data");

        let start = Instant::now();

        let mut stmt = sqlx::query_as::<_, TelemetryRecord>(&sql).bind(&query.vehicle_id);
        if let Some(initial) = query.initial_timestamp {
            stmt = stmt.bind(initial);
        }
        if let Some(final_ts) = query.final_timestamp {
            stmt = stmt.bind(final_ts);
        }
        stmt = stmt
            .bind(query.limit.unwrap_or(DEFAULT_LIMIT))
            .bind(query.skip.unwrap_or(0));

        let records = stmt.fetch_all(&self.pool).await?;

        QUERY_HISTOGRAM.observe(start.elapsed().as_secs_f64());
        Ok(records)
    }

    /// Point lookup by id. Missing ids are an error, unlike an unmatched
    /// vehicle filter.
    pub async fn get_vehicle_data_by_id(&self, id: i64) -> Result<TelemetryRecord, TelemetryError> {
        let record = sqlx::query_as::<_, TelemetryRecord>(&format!(
            "{SELECT_COLUMNS} WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        record.ok_or(TelemetryError::NotFound(id))
    }

    /// Persist one record and return it with its assigned id.
    ///
    /// The insert is a single statement, so it is atomic: either the row
    /// is fully persisted and visible to subsequent reads, or nothing is.
    /// The returned record is read back from the store rather than echoed
    /// from the input, so it reflects exactly what later reads will see.
    pub async fn add_vehicle_data(
        &self,
        record: &NewTelemetryRecord,
    ) -> Result<TelemetryRecord, TelemetryError> {
        let result = sqlx::query(
            "INSERT INTO vehicle_data \
             (vehicle_id, timestamp, speed, odometer, elevation, soc, shift_state) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.vehicle_id)
        .bind(record.timestamp)
        .bind(record.speed)
        .bind(record.odometer)
        .bind(record.elevation)
        .bind(record.soc)
        .bind(&record.shift_state)
        .execute(&self.pool)
        .await?;

        INSERT_COUNTER.inc();

        let id = result.last_insert_rowid();
        self.get_vehicle_data_by_id(id).await
    }

    /// Bulk administrative delete of every record. Returns the number of
    /// rows removed. There is deliberately no per-record delete.
    pub async fn delete_all(&self) -> Result<u64, TelemetryError> {
        let result = sqlx::query("DELETE FROM vehicle_data")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
