//! Viewport Query Adapter.
//!
//! Thin wrappers over [`SpatialLayer`] queries plus the helpers that turn
//! attribute rows into the values the aggregator consumes.

use serde::{Deserialize, Serialize};

use crate::layers::{AttributeRow, LayerResult, SpatialLayer};
use crate::models::{instant_from_millis, Instant};

/// Attribute rows for the features intersecting a query, in encounter order.
pub type SpatialQueryResult = Vec<AttributeRow>;

/// Rows for features intersecting `region`. Empty when nothing is in view.
pub async fn query_by_region(
    layer: &dyn SpatialLayer,
    region: &geo::Rect<f64>,
    fields: &[&str],
) -> LayerResult<SpatialQueryResult> {
    let rows = layer.query_region(region, fields).await?;
    log::debug!("Region query on '{}' matched {} feature(s)", layer.id(), rows.len());
    Ok(rows)
}

/// Rows for features under `point`. Empty when nothing is there.
pub async fn query_by_point(
    layer: &dyn SpatialLayer,
    point: &geo::Point<f64>,
    fields: &[&str],
) -> LayerResult<SpatialQueryResult> {
    let rows = layer.query_point(point, fields).await?;
    log::debug!("Point query on '{}' matched {} feature(s)", layer.id(), rows.len());
    Ok(rows)
}

/// How to pick one value when a point query hits several overlapping features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointResolution {
    /// Use the first feature in encounter order, ignoring the rest.
    #[default]
    FirstFeature,
    /// Use the largest numeric value among all hits.
    HighestValue,
}

impl PointResolution {
    /// Resolve `field` over the hits of a point query.
    pub fn resolve(self, rows: &[AttributeRow], field: &str) -> Option<f64> {
        match self {
            PointResolution::FirstFeature => {
                let first = rows.first()?;
                let value = number(first, field);
                if value.is_none() {
                    log::warn!("First feature has no numeric '{}' attribute", field);
                }
                value
            }
            PointResolution::HighestValue => rows
                .iter()
                .filter_map(|row| number(row, field))
                .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v)))),
        }
    }
}

/// Numeric attribute value, if present.
pub fn number(row: &AttributeRow, field: &str) -> Option<f64> {
    row.get(field).and_then(serde_json::Value::as_f64)
}

/// Epoch-millisecond attributes as instants. Rows without a usable value are skipped.
pub fn instants(rows: &[AttributeRow], field: &str) -> Vec<Instant> {
    let mut skipped = 0usize;
    let values: Vec<Instant> = rows
        .iter()
        .filter_map(|row| {
            let instant = row
                .get(field)
                .and_then(serde_json::Value::as_i64)
                .and_then(instant_from_millis);
            if instant.is_none() {
                skipped += 1;
            }
            instant
        })
        .collect();

    if skipped > 0 {
        log::warn!("Skipped {} row(s) without a valid '{}' timestamp", skipped, field);
    }
    values
}
