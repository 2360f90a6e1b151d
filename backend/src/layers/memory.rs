//! In-memory spatial layer.
//!
//! Holds decoded `geo` geometries with their attributes and answers region and
//! point queries by linear scan. Suitable for the eclipse datasets, which are
//! a few thousand features at most, and for tests.

use async_trait::async_trait;
use geo::Intersects;
use geojson::{FeatureCollection, GeoJson};
use std::io::Read;

use super::error::{ErrorContext, LayerError, LayerResult};
use super::{AttributeRow, LayerKind, SpatialLayer, ALL_FIELDS};

const LATITUDE_COLUMNS: [&str; 4] = ["lat", "latitude", "y", "ycenter"];
const LONGITUDE_COLUMNS: [&str; 5] = ["lon", "long", "longitude", "x", "xcenter"];

#[derive(Debug, Clone)]
struct StoredFeature {
    geometry: geo::Geometry<f64>,
    properties: AttributeRow,
}

/// Layer whose features live in a `Vec`, in load order.
#[derive(Debug, Clone)]
pub struct InMemoryLayer {
    id: String,
    title: String,
    kind: LayerKind,
    features: Vec<StoredFeature>,
}

impl InMemoryLayer {
    /// Create an empty layer.
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            features: Vec::new(),
        }
    }

    /// Load a GeoJSON feature collection. Features without geometry are skipped.
    pub fn from_feature_collection(
        id: impl Into<String>,
        title: impl Into<String>,
        collection: FeatureCollection,
    ) -> LayerResult<Self> {
        let mut layer = Self::new(id, title, LayerKind::GeoJson);
        let mut skipped = 0usize;

        for (index, feature) in collection.features.into_iter().enumerate() {
            let Some(geometry) = feature.geometry else {
                skipped += 1;
                continue;
            };
            let geometry = geo::Geometry::<f64>::try_from(geometry).map_err(|e| {
                LayerError::load(
                    format!("Unsupported geometry in feature {}: {}", index, e),
                    ErrorContext::new("load_geojson").with_layer(layer.id.clone()),
                )
            })?;
            layer.push(geometry, feature.properties.unwrap_or_default());
        }

        if skipped > 0 {
            log::warn!(
                "Layer '{}': skipped {} feature(s) without geometry",
                layer.id,
                skipped
            );
        }
        Ok(layer)
    }

    /// Parse GeoJSON text. Accepts a feature collection or a single feature.
    pub fn from_geojson_str(
        id: impl Into<String>,
        title: impl Into<String>,
        text: &str,
    ) -> LayerResult<Self> {
        let id = id.into();
        let context = || ErrorContext::new("load_geojson").with_layer(id.clone());

        let parsed: GeoJson = text
            .parse()
            .map_err(|e| LayerError::load(format!("Invalid GeoJSON: {}", e), context()))?;

        let collection = match parsed {
            GeoJson::FeatureCollection(fc) => fc,
            GeoJson::Feature(feature) => FeatureCollection {
                bbox: None,
                features: vec![feature],
                foreign_members: None,
            },
            GeoJson::Geometry(_) => {
                return Err(LayerError::load(
                    "Bare geometry has no attributes; expected a Feature or FeatureCollection",
                    context(),
                ))
            }
        };

        Self::from_feature_collection(id, title, collection)
    }

    /// Load point features from CSV with a header row.
    ///
    /// Latitude and longitude columns are detected by name, case-insensitively.
    /// Remaining columns become attributes; numeric cells are stored as numbers.
    pub fn from_csv_reader<R: Read>(
        id: impl Into<String>,
        title: impl Into<String>,
        reader: R,
    ) -> LayerResult<Self> {
        let mut layer = Self::new(id, title, LayerKind::Csv);
        let layer_id = layer.id.clone();
        let context = || ErrorContext::new("load_csv").with_layer(layer_id.clone());

        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| LayerError::load(format!("Invalid CSV header: {}", e), context()))?
            .clone();

        let find = |candidates: &[&str]| {
            headers
                .iter()
                .position(|h| candidates.contains(&h.trim().to_lowercase().as_str()))
        };
        let (Some(lat_idx), Some(lon_idx)) = (find(&LATITUDE_COLUMNS), find(&LONGITUDE_COLUMNS))
        else {
            return Err(LayerError::load(
                "CSV has no recognizable latitude/longitude columns",
                context().with_details(format!("headers={:?}", headers)),
            ));
        };

        for (row_number, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| {
                LayerError::load(format!("Invalid CSV row {}: {}", row_number + 1, e), context())
            })?;
            let coordinate = |idx: usize| -> LayerResult<f64> {
                record
                    .get(idx)
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .ok_or_else(|| {
                        LayerError::load(
                            format!("Row {} has a non-numeric coordinate", row_number + 1),
                            context(),
                        )
                    })
            };
            let point = geo::Point::new(coordinate(lon_idx)?, coordinate(lat_idx)?);

            let mut properties = AttributeRow::new();
            for (name, value) in headers.iter().zip(record.iter()) {
                properties.insert(name.to_string(), csv_cell_value(value));
            }
            layer.push(geo::Geometry::Point(point), properties);
        }

        Ok(layer)
    }

    /// Append a feature.
    pub fn push(&mut self, geometry: geo::Geometry<f64>, properties: AttributeRow) {
        self.features.push(StoredFeature {
            geometry,
            properties,
        });
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn matching(&self, query: &geo::Geometry<f64>, fields: &[&str]) -> Vec<AttributeRow> {
        self.features
            .iter()
            .filter(|f| f.geometry.intersects(query))
            .map(|f| project(&f.properties, fields))
            .collect()
    }
}

fn csv_cell_value(raw: &str) -> serde_json::Value {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return i.into();
    }
    match trimmed.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        Some(n) => serde_json::Value::Number(n),
        None => serde_json::Value::String(raw.to_string()),
    }
}

fn project(properties: &AttributeRow, fields: &[&str]) -> AttributeRow {
    if fields.contains(&ALL_FIELDS) {
        return properties.clone();
    }
    fields
        .iter()
        .filter_map(|f| properties.get(*f).map(|v| (f.to_string(), v.clone())))
        .collect()
}

#[async_trait]
impl SpatialLayer for InMemoryLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> LayerKind {
        self.kind
    }

    fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for feature in &self.features {
            for key in feature.properties.keys() {
                if !fields.iter().any(|f| f == key) {
                    fields.push(key.clone());
                }
            }
        }
        fields
    }

    async fn query_region(
        &self,
        region: &geo::Rect<f64>,
        fields: &[&str],
    ) -> LayerResult<Vec<AttributeRow>> {
        Ok(self.matching(&geo::Geometry::Rect(*region), fields))
    }

    async fn query_point(
        &self,
        point: &geo::Point<f64>,
        fields: &[&str],
    ) -> LayerResult<Vec<AttributeRow>> {
        Ok(self.matching(&geo::Geometry::Point(*point), fields))
    }
}
