//! Connection pool construction and schema bootstrap for the telemetry store.
//!
//! The pool is built once at startup and handed to `VehicleDataService`
//! explicitly; nothing in this crate holds a module-level database handle.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Open a SQLite connection pool for the given database URL.
///
/// # Arguments
///
/// * `database_url` - SQLite URL, e.g. `sqlite://vehicle_data.db?mode=rwc`.
///
/// # Returns
///
/// * `Ok(SqlitePool)` - A ready pool with a small connection cap.
/// * `Err` - If the database cannot be opened.
pub async fn connect_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Create the `vehicle_data` table and its indexes if they do not exist.
///
/// Runs at startup in both binaries; an already-initialised database is
/// left untouched.
///
/// # Notes
///
/// `timestamp` and every measurement column are nullable; only
/// `vehicle_id` is required. `id` auto-increments and is never reused.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vehicle_data (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            vehicle_id  TEXT NOT NULL,
            timestamp   TEXT,
            speed       REAL,
            odometer    REAL,
            elevation   REAL,
            soc         REAL,
            shift_state TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_vehicle_data_vehicle_id ON vehicle_data (vehicle_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_vehicle_data_timestamp ON vehicle_data (timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Convenience for tests and local experiments: an in-memory database
/// with the schema already applied.
///
/// Capped at one connection: each SQLite `:memory:` connection is its
/// own database, so a wider pool would scatter rows across them.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}
