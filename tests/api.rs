//! Integration tests for the HTTP layer: routing, parameter handling,
//! status mapping and download headers, driven through `handle_request`
//! without a running server.

use std::sync::Arc;

use hyper::{Body, Method, Request, Response, StatusCode};
use serde_json::{json, Value};

use vehicle_telemetry_service::api::{handle_request, ApiContext};
use vehicle_telemetry_service::config::Settings;
use vehicle_telemetry_service::db;
use vehicle_telemetry_service::service::VehicleDataService;

const DEFAULT_VEHICLE_ID: &str = "f212b271-f033-444c-a445-560511f95e9c";

async fn test_ctx() -> Arc<ApiContext> {
    let pool = db::connect_in_memory().await.expect("in-memory pool");
    Arc::new(ApiContext {
        service: VehicleDataService::new(pool),
        settings: Settings {
            database_url: "sqlite::memory:".to_string(),
            server_bind: "127.0.0.1:0".to_string(),
            default_vehicle_id: DEFAULT_VEHICLE_ID.to_string(),
        },
    })
}

async fn get(ctx: &Arc<ApiContext>, uri: &str) -> Response<Body> {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    handle_request(req, ctx.clone()).await.unwrap()
}

async fn post_json(ctx: &Arc<ApiContext>, uri: &str, body: Value) -> Response<Body> {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    handle_request(req, ctx.clone()).await.unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_returns_the_greeting() {
    let ctx = test_ctx().await;
    let response = get(&ctx, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"Hello World": "Hello World"}));
}

#[tokio::test]
async fn healthz_is_alive() {
    let ctx = test_ctx().await;
    let response = get(&ctx, "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_store_lists_an_empty_array() {
    let ctx = test_ctx().await;
    let response = get(&ctx, "/api/v1/vehicle_data/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn post_then_point_lookup_returns_the_record_with_nulls() {
    let ctx = test_ctx().await;

    let response = post_json(
        &ctx,
        "/api/v1/vehicle_data/",
        json!({
            "vehicle_id": "my_vehicle_id",
            "timestamp": "2032-01-01T00:00:00",
            "speed": 50,
            "elevation": 9545
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let posted = body_json(response).await;
    assert_eq!(posted["id"], json!(1));

    let response = get(&ctx, "/api/v1/vehicle_data/1/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "id": 1,
            "vehicle_id": "my_vehicle_id",
            "timestamp": "2032-01-01T00:00:00",
            "speed": 50.0,
            "odometer": null,
            "elevation": 9545.0,
            "soc": null,
            "shift_state": null
        })
    );
}

#[tokio::test]
async fn unknown_id_returns_404_with_detail() {
    let ctx = test_ctx().await;
    let response = get(&ctx, "/api/v1/vehicle_data/99/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("99"));
}

#[tokio::test]
async fn listing_filters_on_the_vehicle_id_parameter() {
    let ctx = test_ctx().await;
    post_json(
        &ctx,
        "/api/v1/vehicle_data/",
        json!({"vehicle_id": "aa", "timestamp": "2022-01-01T00:00:00", "speed": 50}),
    )
    .await;

    let response = get(&ctx, "/api/v1/vehicle_data/?vehicle_id=aa").await;
    let body = body_json(response).await;
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["vehicle_id"], json!("aa"));
    assert_eq!(records[0]["timestamp"], json!("2022-01-01T00:00:00"));
    assert_eq!(records[0]["elevation"], json!(null));

    // The default vehicle id sees none of it
    let response = get(&ctx, "/api/v1/vehicle_data/").await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn sort_and_pagination_parameters_reach_the_query() {
    let ctx = test_ctx().await;
    for d in ["01", "02", "03"] {
        post_json(
            &ctx,
            "/api/v1/vehicle_data/",
            json!({
                "vehicle_id": "BONJOUR",
                "timestamp": format!("2032-01-{d}T00:00:00"),
                "speed": 50
            }),
        )
        .await;
    }

    let response = get(
        &ctx,
        "/api/v1/vehicle_data/?vehicle_id=BONJOUR&sort-by=DESC&limit=2&skip=1",
    )
    .await;
    let body = body_json(response).await;
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["timestamp"], json!("2032-01-02T00:00:00"));
    assert_eq!(records[1]["timestamp"], json!("2032-01-01T00:00:00"));
}

#[tokio::test]
async fn csv_export_is_a_download_attachment() {
    let ctx = test_ctx().await;
    post_json(
        &ctx,
        "/api/v1/vehicle_data/",
        json!({"vehicle_id": "V1", "timestamp": "2032-01-01T00:00:00", "speed": 50}),
    )
    .await;

    let response = get(&ctx, "/api/v1/vehicle_data/?vehicle_id=V1&export-format=CSV").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("Content-Type").unwrap(),
        "text/csv"
    );
    assert_eq!(
        response.headers().get("Content-Disposition").unwrap(),
        "attachment; filename=vehicle_data.csv"
    );

    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("vehicle_id,timestamp,speed,odometer,elevation,soc,shift_state\n"));
    assert!(text.contains("V1,2032-01-01T00:00:00,50.0"));
}

#[tokio::test]
async fn json_export_carries_the_json_media_type() {
    let ctx = test_ctx().await;
    let response = get(&ctx, "/api/v1/vehicle_data/?export-format=json").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("Content-Disposition").unwrap(),
        "attachment; filename=vehicle_data.json"
    );
    assert_eq!(
        response.headers().get("Content-Type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn malformed_parameters_are_client_errors() {
    let ctx = test_ctx().await;

    let response = get(&ctx, "/api/v1/vehicle_data/?limit=three").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(&ctx, "/api/v1/vehicle_data/?initial-timestamp=yesterday").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(&ctx, "/api/v1/vehicle_data/?export-format=xml").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(&ctx, "/api/v1/vehicle_data/seven/").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let ctx = test_ctx().await;
    let response = post_json(&ctx, "/api/v1/vehicle_data/", json!({"speed": 50})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_routes_return_404() {
    let ctx = test_ctx().await;
    let response = get(&ctx, "/api/v2/nothing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
