//! Bulk CSV loader: drop all stored vehicle data, then import every `*.csv`
//! file found in the data directory (first CLI argument, default `data`).
//! Each file's basename becomes the `vehicle_id` for its rows.

use std::env;
use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use vehicle_telemetry_service::config::Settings;
use vehicle_telemetry_service::db;
use vehicle_telemetry_service::importer;
use vehicle_telemetry_service::service::VehicleDataService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let settings = Settings::new()?;
    let data_dir = env::args().nth(1).unwrap_or_else(|| "data".to_string());

    let pool = db::connect_pool(&settings.database_url).await?;
    db::init_schema(&pool).await?;
    let service = VehicleDataService::new(pool);

    // Fresh load: everything currently stored goes first
    let removed = service.delete_all().await?;
    info!(removed, "Dropped existing vehicle data");

    let mut csv_files: Vec<PathBuf> = std::fs::read_dir(&data_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().map(|ext| ext == "csv").unwrap_or(false)
        })
        .collect();
    csv_files.sort();

    info!(dir = %data_dir, files = csv_files.len(), "Starting import");

    let mut total = 0u64;
    for path in &csv_files {
        match importer::import_file(&service, path).await {
            Ok(count) => {
                total += count;
                info!(file = %path.display(), count, "Data imported successfully");
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "Failed to import file");
            }
        }
    }

    info!(total, "Import complete");
    Ok(())
}
