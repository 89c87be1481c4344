//! Entrypoint: set up tracing, bootstrap the database schema, and serve the
//! vehicle telemetry REST API together with the `/metrics` and `/healthz`
//! endpoints.
//!
//! This application uses a strongly-typed configuration (`Settings`) defined in `config.rs`,
//! which provides:
//!  - `database_url`         – SQLite connection string
//!  - `server_bind`          – HTTP bind address for the API, metrics & health endpoints
//!  - `default_vehicle_id`   – Vehicle id used when a listing request names none

use std::{net::SocketAddr, sync::Arc};

use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use vehicle_telemetry_service::api::{self, ApiContext};
use vehicle_telemetry_service::config::Settings;
use vehicle_telemetry_service::db;
use vehicle_telemetry_service::service::VehicleDataService;

/// Application entrypoint for the vehicle telemetry service.
///
/// **Workflow**:
/// 1. Initialise tracing/logging from `RUST_LOG` (or default to `info`).
/// 2. Load `Config.toml` (and apply any `APP__…` env-var overrides).
/// 3. Open the SQLite pool and create the `vehicle_data` table if needed.
/// 4. Serve the REST API (plus `/metrics` and `/healthz`) until shutdown.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ───────────────────────────────────────────────────────────────
    // 1. Initialise tracing / logging
    // ───────────────────────────────────────────────────────────────
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    info!("Starting vehicle telemetry service…");

    // ───────────────────────────────────────────────────────────────
    // 2. Load configuration
    // ───────────────────────────────────────────────────────────────
    let settings = Settings::new()?;
    info!(?settings, "Loaded configuration");

    // ───────────────────────────────────────────────────────────────
    // 3. Database pool & schema
    // ───────────────────────────────────────────────────────────────
    let pool = db::connect_pool(&settings.database_url).await?;
    info!("Connected to SQLite");

    db::init_schema(&pool).await?;
    info!("Schema ready");

    // ───────────────────────────────────────────────────────────────
    // 4. HTTP server for the API, metrics & health
    // ───────────────────────────────────────────────────────────────
    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .expect("Invalid `server_bind` in configuration");

    let ctx = Arc::new(ApiContext {
        service: VehicleDataService::new(pool),
        settings,
    });

    let make_svc = make_service_fn(move |_conn| {
        let ctx = ctx.clone();
        async move {
            Ok::<_, std::convert::Infallible>(service_fn(move |req| {
                api::handle_request(req, ctx.clone())
            }))
        }
    });

    info!(%addr, "Serving vehicle telemetry API");
    Server::bind(&addr).serve(make_svc).await?;

    Ok(())
}
