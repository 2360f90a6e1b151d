//! HTTP API tests against a server state loaded from fixture files.

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use eclipse_panel::config::PanelConfig;
use eclipse_panel::http::{create_router, AppState};
use eclipse_panel::layers::{LayerCatalog, LayerEntry, LayerSource, LayerSpec, SpatialLayer};
use eclipse_panel::models::EventDate;
use eclipse_panel::services::{
    build, DetailThreshold, PointResolution, StationaryDebouncer, ViewportCycle,
};

async fn fixture_router(quiet_ms: u64) -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    support::write_fixture_files(dir.path(), quiet_ms);
    let config = PanelConfig::from_file(dir.path().join("eclipse.toml")).unwrap();
    let state = AppState::initialize(&config).await.unwrap();
    (create_router(state), dir)
}

/// Router whose penumbra layer fails every query.
fn unreachable_penumbra_router(retryable: bool) -> Router {
    let entry = |layer: Arc<dyn SpatialLayer>, source: LayerSource| LayerEntry {
        spec: LayerSpec {
            id: layer.id().to_string(),
            title: layer.title().to_string(),
            kind: layer.kind(),
            source,
            visible: true,
        },
        layer,
        popup: None,
    };
    let file = |path: &str| LayerSource::File { path: path.into() };

    let catalog = LayerCatalog::from_entries(vec![
        entry(
            Arc::new(support::UnreachableLayer::new("penumbra", retryable)),
            file("data/penumbra.geojson"),
        ),
        entry(
            support::value_layer("duration", "Duration", 212.4),
            file("data/duration.geojson"),
        ),
        entry(support::city_layer(&support::ohio_records()), LayerSource::CityTimes),
    ]);
    let cycle = ViewportCycle::from_catalog(
        &catalog,
        DetailThreshold::default(),
        PointResolution::FirstFeature,
        support::utc_panel(),
    )
    .unwrap();
    let cities = build(&support::ohio_records(), EventDate::default())
        .unwrap()
        .to_geojson();
    let (debouncer, _settled) = StationaryDebouncer::spawn(Duration::from_millis(250));

    create_router(AppState::new(
        Arc::new(catalog),
        Arc::new(cities),
        cycle,
        debouncer,
    ))
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn viewport_body(scale: f64) -> Value {
    json!({
        "extent": { "xmin": -90.0, "ymin": 35.0, "xmax": -80.0, "ymax": 45.0 },
        "center": { "lon": -85.0, "lat": 40.0 },
        "scale": scale,
        "zoom": 7.0
    })
}

#[tokio::test]
async fn test_health_reports_city_count() {
    let (router, _dir) = fixture_router(250).await;
    let (status, body) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cities"], 3);
}

#[tokio::test]
async fn test_cities_are_geojson_with_phase_millis() {
    let (router, _dir) = fixture_router(250).await;
    let (status, body) = get_json(&router, "/v1/cities").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");

    let dayton = &body["features"][0];
    assert_eq!(dayton["geometry"]["type"], "Point");
    assert_eq!(dayton["properties"]["name"], "Dayton");
    // 2024-04-08T18:00:00Z
    assert_eq!(dayton["properties"]["t0"], 1_712_599_200_000_i64);
}

#[tokio::test]
async fn test_layers_listed_in_draw_order() {
    let (router, _dir) = fixture_router(250).await;
    let (_, body) = get_json(&router, "/v1/layers").await;
    assert_eq!(body["total"], 3);

    let layers = body["layers"].as_array().unwrap();
    let ids: Vec<&str> = layers.iter().map(|l| l["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["penumbra", "duration", "city-times"]);
    assert_eq!(layers[1]["visible"], false);
    assert_eq!(layers[2]["popup"]["fields"][0]["label"], "Start time");
    assert_eq!(layers[2]["popup"]["fields"][4]["field_name"], "t4");
}

#[tokio::test]
async fn test_stationary_viewport_updates_panel() {
    let (router, _dir) = fixture_router(250).await;
    let (status, body) = post_json(&router, "/v1/viewport/stationary", viewport_body(500_000.0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["panel"]["start_time"]["text"], "6:02:00 PM");
    assert_eq!(body["panel"]["obscuration"]["text"], "91%");

    let (_, panel) = get_json(&router, "/v1/panel").await;
    assert_eq!(panel["duration"]["text"], "212 seconds");
    assert_eq!(panel["zoom_notice_visible"], false);
}

#[tokio::test]
async fn test_zoomed_out_stationary_viewport() {
    let (router, _dir) = fixture_router(250).await;
    let (status, body) =
        post_json(&router, "/v1/viewport/stationary", viewport_body(2_000_000.0)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["stats"].is_null());
    assert_eq!(body["panel"]["zoom_notice_visible"], true);
    assert_eq!(body["panel"]["start_time"]["value"], "unknown");
}

#[tokio::test]
async fn test_invalid_viewport_is_bad_request() {
    let (router, _dir) = fixture_router(250).await;
    let mut body = viewport_body(500_000.0);
    body["extent"]["xmin"] = json!(-70.0);

    let (status, error) = post_json(&router, "/v1/viewport/stationary", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_debounced_viewport_eventually_updates_panel() {
    let (router, _dir) = fixture_router(20).await;
    let (status, body) = post_json(&router, "/v1/viewport", viewport_body(500_000.0)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["quiet_ms"], 20);

    let mut text = Value::Null;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let (_, panel) = get_json(&router, "/v1/panel").await;
        text = panel["start_time"]["text"].clone();
        if text != "" {
            break;
        }
    }
    assert_eq!(text, "6:02:00 PM");
}

#[tokio::test]
async fn test_retryable_layer_failure_is_503() {
    let router = unreachable_penumbra_router(true);
    let (status, error) =
        post_json(&router, "/v1/viewport/stationary", viewport_body(500_000.0)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error["code"], "LAYER_ERROR");

    let details = error["details"].as_str().unwrap();
    assert!(details.contains("operation=query_point"));
    assert!(details.contains("layer=penumbra"));
    assert!(details.contains("retryable=true"));

    // The failed cycle did not touch the panel.
    let (_, panel) = get_json(&router, "/v1/panel").await;
    assert_eq!(panel["start_time"]["hidden"], true);
}

#[tokio::test]
async fn test_permanent_layer_failure_is_500() {
    let router = unreachable_penumbra_router(false);
    let (status, error) =
        post_json(&router, "/v1/viewport/stationary", viewport_body(500_000.0)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["code"], "LAYER_ERROR");
    assert!(error["details"].as_str().unwrap().contains("layer=penumbra"));
}

#[tokio::test]
async fn test_catalog_from_loaded_layers_is_listed() {
    let router = unreachable_penumbra_router(true);
    let (_, body) = get_json(&router, "/v1/layers").await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["layers"][2]["kind"], "geo-json");
    assert!(body["layers"][0].get("popup").is_none());
}
