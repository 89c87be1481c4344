//! api.rs
//!
//! HTTP routing and request handling: parse paths/query parameters/bodies,
//! invoke the data-access layer, and map errors onto status codes. Also
//! serves the `/metrics` and `/healthz` endpoints.

use chrono::{DateTime, NaiveDateTime};
use hyper::{Body, Method, Request, Response, StatusCode};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Settings;
use crate::errors::TelemetryError;
use crate::exporter;
use crate::metrics::{self, HTTP_REQUEST_COUNTER};
use crate::models::{ExportFormat, NewTelemetryRecord, SortBy};
use crate::service::{VehicleDataQuery, VehicleDataService};

const VEHICLE_DATA_PATH: &str = "/api/v1/vehicle_data/";

/// Everything a request handler needs, shared across requests.
pub struct ApiContext {
    pub service: VehicleDataService,
    pub settings: Settings,
}

/// Top-level request dispatcher, one call per inbound request.
pub async fn handle_request(
    req: Request<Body>,
    ctx: Arc<ApiContext>,
) -> Result<Response<Body>, Infallible> {
    HTTP_REQUEST_COUNTER.inc();

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let result = match (&method, path.as_str()) {
        // ─── GREETING / LIVENESS PLACEHOLDER ────────────────────────
        (&Method::GET, "/") => Ok(json_response(
            StatusCode::OK,
            &json!({"Hello World": "Hello World"}),
        )),

        // ─── HEALTHCHECK ENDPOINT ───────────────────────────────────
        (&Method::GET, "/healthz") => Ok(Response::new(Body::from("OK"))),

        // ─── METRICS ENDPOINT ───────────────────────────────────────
        (&Method::GET, "/metrics") => Ok(metrics_response()),

        // ─── VEHICLE DATA ───────────────────────────────────────────
        (&Method::GET, VEHICLE_DATA_PATH) => list_vehicle_data(&req, &ctx).await,
        (&Method::POST, VEHICLE_DATA_PATH) => add_vehicle_data(req, &ctx).await,
        (&Method::GET, p) if p.starts_with(VEHICLE_DATA_PATH) => {
            match parse_id_path(p) {
                Ok(id) => get_vehicle_data_by_id(id, &ctx).await,
                Err(e) => Err(e),
            }
        }

        // ─── ANY OTHER ROUTE ────────────────────────────────────────
        _ => Ok(not_found_response()),
    };

    let response = result.unwrap_or_else(|e| error_response(&e));
    info!(method = %method, path = %path, status = %response.status(), "Handled request");
    Ok(response)
}

/// GET /api/v1/vehicle_data/: filtered/sorted/paginated listing, with an
/// optional export-format switch turning the response into a download.
async fn list_vehicle_data(
    req: &Request<Body>,
    ctx: &ApiContext,
) -> Result<Response<Body>, TelemetryError> {
    let (query, export_format) =
        parse_query_params(req.uri().query().unwrap_or(""), &ctx.settings.default_vehicle_id)?;

    let records = ctx.service.get_vehicle_data(&query).await?;

    match export_format {
        None => {
            let body = serde_json::to_string(&records)?;
            Ok(json_body_response(StatusCode::OK, body))
        }
        Some(format) => {
            let body = exporter::export(&records, format)?;
            let response = Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", format.content_type())
                .header(
                    "Content-Disposition",
                    format!("attachment; filename=vehicle_data.{}", format.extension()),
                )
                .body(Body::from(body))
                .expect("Failed to build export response");
            Ok(response)
        }
    }
}

/// GET /api/v1/vehicle_data/{id}/: one record, or 404.
async fn get_vehicle_data_by_id(
    id: i64,
    ctx: &ApiContext,
) -> Result<Response<Body>, TelemetryError> {
    let record = ctx.service.get_vehicle_data_by_id(id).await?;
    Ok(json_response(StatusCode::OK, &serde_json::to_value(&record)?))
}

/// POST /api/v1/vehicle_data/: insert one record, echo it back with its
/// assigned id.
async fn add_vehicle_data(
    req: Request<Body>,
    ctx: &ApiContext,
) -> Result<Response<Body>, TelemetryError> {
    let bytes = hyper::body::to_bytes(req.into_body())
        .await
        .map_err(|e| TelemetryError::InvalidParam {
            name: "body".into(),
            value: e.to_string(),
        })?;

    let record: NewTelemetryRecord =
        serde_json::from_slice(&bytes).map_err(|e| TelemetryError::InvalidParam {
            name: "body".into(),
            value: e.to_string(),
        })?;

    let persisted = ctx.service.add_vehicle_data(&record).await?;
    Ok(json_response(StatusCode::OK, &serde_json::to_value(&persisted)?))
}

/// Translate the raw query string into a [`VehicleDataQuery`] plus the
/// optional export format. Malformed values are rejected here, before any
/// storage call.
fn parse_query_params(
    query_string: &str,
    default_vehicle_id: &str,
) -> Result<(VehicleDataQuery, Option<ExportFormat>), TelemetryError> {
    let params: HashMap<String, String> = url::form_urlencoded::parse(query_string.as_bytes())
        .into_owned()
        .collect();

    let mut query = VehicleDataQuery::for_vehicle(
        params
            .get("vehicle_id")
            .map(String::as_str)
            .unwrap_or(default_vehicle_id),
    );

    if let Some(raw) = params.get("initial-timestamp") {
        query.initial_timestamp = Some(parse_timestamp("initial-timestamp", raw)?);
    }
    if let Some(raw) = params.get("final-timestamp") {
        query.final_timestamp = Some(parse_timestamp("final-timestamp", raw)?);
    }
    if let Some(raw) = params.get("sort-by") {
        query.sort_by = Some(SortBy::from_str(raw)?);
    }
    if let Some(raw) = params.get("limit") {
        query.limit = Some(parse_int("limit", raw)?);
    }
    if let Some(raw) = params.get("skip") {
        query.skip = Some(parse_int("skip", raw)?);
    }

    let export_format = params
        .get("export-format")
        .map(|raw| ExportFormat::from_str(raw))
        .transpose()?;

    Ok((query, export_format))
}

/// Accepts ISO-8601 date-times with or without fractional seconds, and
/// RFC 3339 values with an offset (the offset is dropped after conversion
/// to UTC).
fn parse_timestamp(name: &str, raw: &str) -> Result<NaiveDateTime, TelemetryError> {
    if let Ok(ts) = NaiveDateTime::from_str(raw) {
        return Ok(ts);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .map_err(|_| TelemetryError::InvalidParam {
            name: name.into(),
            value: raw.into(),
        })
}

fn parse_int(name: &str, raw: &str) -> Result<i64, TelemetryError> {
    raw.parse::<i64>().map_err(|_| TelemetryError::InvalidParam {
        name: name.into(),
        value: raw.into(),
    })
}

/// Extract the record id from `/api/v1/vehicle_data/{id}/`.
fn parse_id_path(path: &str) -> Result<i64, TelemetryError> {
    let rest = path
        .strip_prefix(VEHICLE_DATA_PATH)
        .unwrap_or(path)
        .trim_end_matches('/');
    parse_int("id", rest)
}

fn json_response(status: StatusCode, value: &serde_json::Value) -> Response<Body> {
    json_body_response(status, value.to_string())
}

fn json_body_response(status: StatusCode, body: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .expect("Failed to build JSON response")
}

fn not_found_response() -> Response<Body> {
    json_response(
        StatusCode::NOT_FOUND,
        &json!({"detail": "Not Found"}),
    )
}

// The `Content-Type` header on `/metrics` must be
//     text/plain; version=0.0.4; charset=utf-8
// or Prometheus (v3+) will reject the scrape.
fn metrics_response() -> Response<Body> {
    let metrics_text = metrics::gather_metrics();
    let encoder = TextEncoder::new();
    let mime = encoder.format_type();

    Response::builder()
        .header("Content-Type", mime)
        .body(Body::from(metrics_text))
        .expect("Failed to build /metrics response")
}

/// Map a [`TelemetryError`] onto the HTTP status taxonomy: unknown ids are
/// 404, anything the caller got wrong is 400, storage failures are 500.
fn error_response(err: &TelemetryError) -> Response<Body> {
    let status = match err {
        TelemetryError::NotFound(_) => StatusCode::NOT_FOUND,
        TelemetryError::InvalidFormat(_) | TelemetryError::InvalidParam { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "Request failed");
    }

    json_response(status, &json!({"detail": err.to_string()}))
}
