#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::FixedOffset;
use parking_lot::RwLock;
use serde_json::json;

use eclipse_panel::layers::{
    AttributeRow, ErrorContext, InMemoryLayer, LayerError, LayerKind, LayerResult, SpatialLayer,
};
use eclipse_panel::models::{CityTimingRecord, EventDate, Extent, LonLat, ViewportSnapshot};
use eclipse_panel::services::{
    build, DetailThreshold, PanelHandle, PanelZone, PointResolution, ReadoutPanel, ViewportCycle,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to the process
/// environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Area every fixture layer covers.
pub const FIXTURE_EXTENT: Extent = Extent {
    xmin: -90.0,
    ymin: 35.0,
    xmax: -80.0,
    ymax: 45.0,
};

pub fn city_record(name: &str, lon: f64, lat: f64, start: &str, end: &str) -> CityTimingRecord {
    CityTimingRecord {
        name: name.to_string(),
        state: "OH".to_string(),
        longitude: lon,
        latitude: lat,
        eclipse_times: vec![
            start.to_string(),
            "18:40:00".to_string(),
            "19:15:00".to_string(),
            "19:50:00".to_string(),
            end.to_string(),
        ],
    }
}

/// Three cities starting at 18:00, 18:02 and 18:04 UTC.
pub fn ohio_records() -> Vec<CityTimingRecord> {
    vec![
        city_record("Dayton", -84.19, 39.76, "18:00:00", "20:28:00"),
        city_record("Columbus", -83.0, 39.96, "18:02:00", "20:30:00"),
        city_record("Cleveland", -81.69, 41.5, "18:04:00", "20:32:00"),
    ]
}

pub fn city_layer(records: &[CityTimingRecord]) -> Arc<dyn SpatialLayer> {
    let features = build(records, EventDate::default()).unwrap();
    Arc::new(
        InMemoryLayer::from_feature_collection("city-times", "City Eclipse Times", features.to_geojson())
            .unwrap(),
    )
}

/// A layer with one polygon over [`FIXTURE_EXTENT`] carrying `field = value`.
pub fn value_layer(id: &str, field: &str, value: f64) -> Arc<dyn SpatialLayer> {
    let mut layer = InMemoryLayer::new(id, id, LayerKind::GeoJson);
    let mut properties = AttributeRow::new();
    properties.insert(field.to_string(), json!(value));
    layer.push(FIXTURE_EXTENT.to_rect().to_polygon().into(), properties);
    Arc::new(layer)
}

pub fn empty_layer(id: &str) -> Arc<dyn SpatialLayer> {
    Arc::new(InMemoryLayer::new(id, id, LayerKind::GeoJson))
}

/// A layer whose every query fails.
pub struct UnreachableLayer {
    id: String,
    retryable: bool,
}

impl UnreachableLayer {
    pub fn new(id: &str, retryable: bool) -> Self {
        Self {
            id: id.to_string(),
            retryable,
        }
    }

    fn failure(&self, operation: &str) -> LayerError {
        let context = ErrorContext::new(operation).with_layer(self.id.clone());
        let context = if self.retryable {
            context.retryable()
        } else {
            context
        };
        LayerError::query("feature service unreachable", context)
    }
}

#[async_trait::async_trait]
impl SpatialLayer for UnreachableLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> LayerKind {
        LayerKind::GeoJson
    }

    fn fields(&self) -> Vec<String> {
        Vec::new()
    }

    async fn query_region(
        &self,
        _region: &geo::Rect<f64>,
        _fields: &[&str],
    ) -> LayerResult<Vec<AttributeRow>> {
        Err(self.failure("query_region"))
    }

    async fn query_point(
        &self,
        _point: &geo::Point<f64>,
        _fields: &[&str],
    ) -> LayerResult<Vec<AttributeRow>> {
        Err(self.failure("query_point"))
    }
}

pub fn utc_panel() -> PanelHandle {
    Arc::new(RwLock::new(ReadoutPanel::new(PanelZone::Fixed(
        FixedOffset::east_opt(0).unwrap(),
    ))))
}

pub fn fixture_cycle(threshold: DetailThreshold) -> ViewportCycle {
    ViewportCycle::new(
        city_layer(&ohio_records()),
        value_layer("penumbra", "Obscuration", 0.91),
        value_layer("duration", "Duration", 212.4),
        threshold,
        PointResolution::FirstFeature,
        utc_panel(),
    )
}

pub fn viewport(scale: f64, zoom: f64) -> ViewportSnapshot {
    ViewportSnapshot {
        extent: FIXTURE_EXTENT,
        center: LonLat::new(-85.0, 40.0),
        scale,
        zoom,
    }
}

/// Write the city dataset, penumbra and duration layers plus an
/// `eclipse.toml` wiring them together into `dir`.
pub fn write_fixture_files(dir: &Path, quiet_ms: u64) {
    let records: Vec<_> = ohio_records()
        .into_iter()
        .map(|r| {
            json!({
                "NAME": r.name,
                "STATE": r.state,
                "LON": r.longitude,
                "LAT": r.latitude,
                "ECLIPSE": r.eclipse_times,
            })
        })
        .collect();
    std::fs::create_dir_all(dir.join("data")).unwrap();
    std::fs::write(
        dir.join("data/city-times.json"),
        serde_json::to_vec(&records).unwrap(),
    )
    .unwrap();

    let polygon = |field: &str, value: f64| {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { field: value },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-90.0, 35.0], [-80.0, 35.0], [-80.0, 45.0], [-90.0, 45.0], [-90.0, 35.0]]]
                }
            }]
        })
        .to_string()
    };
    std::fs::write(dir.join("data/penumbra.geojson"), polygon("Obscuration", 0.91)).unwrap();
    std::fs::write(dir.join("data/duration.geojson"), polygon("Duration", 212.4)).unwrap();

    let config = format!(
        r#"
[viewport]
stationary_quiet_ms = {quiet_ms}

[display]
utc_offset_minutes = 0

[dataset]
source = "data/city-times.json"

[[layers]]
id = "penumbra"
title = "Penumbra"
kind = "geo-json"
source = {{ type = "file", path = "data/penumbra.geojson" }}

[[layers]]
id = "duration"
title = "Duration of Totality"
kind = "geo-json"
source = {{ type = "file", path = "data/duration.geojson" }}
visible = false

[[layers]]
id = "city-times"
title = "City Eclipse Times"
kind = "geo-json"
source = {{ type = "city-times" }}
"#
    );
    std::fs::write(dir.join("eclipse.toml"), config).unwrap();
}
