//! Spatial layer collaborator.
//!
//! The panel never intersects geometries itself. It talks to layers through
//! the [`SpatialLayer`] trait, which a mapping engine (or the bundled
//! [`InMemoryLayer`]) implements.
//!
//! - [`error`]: Error types for layer operations
//! - [`memory`]: In-memory layer backed by `geo` geometries
//! - [`catalog`]: The set of layers shown on the eclipse map

pub mod catalog;
pub mod error;
pub mod memory;

pub use catalog::{LayerCatalog, LayerEntry, LayerSource, LayerSpec, PopupField, PopupTemplate};
pub use error::{ErrorContext, LayerError, LayerResult};
pub use memory::InMemoryLayer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One feature's attributes, restricted to the requested fields.
pub type AttributeRow = serde_json::Map<String, serde_json::Value>;

/// Field list wildcard meaning "every attribute".
pub const ALL_FIELDS: &str = "*";

/// Kind of layer as the map knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    GeoJson,
    Csv,
    Basemap,
}

impl LayerKind {
    /// Whether a popup template can be generated from the layer's fields.
    pub fn supports_auto_popup(self) -> bool {
        match self {
            LayerKind::GeoJson | LayerKind::Csv => true,
            LayerKind::Basemap => false,
        }
    }
}

/// A queryable feature layer.
///
/// Queries return rows in the layer's own encounter order. No intersecting
/// features is an empty `Vec`, never an error.
#[async_trait]
pub trait SpatialLayer: Send + Sync {
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    fn kind(&self) -> LayerKind;

    /// Attribute names available on this layer's features.
    fn fields(&self) -> Vec<String>;

    /// Features intersecting `region`.
    async fn query_region(
        &self,
        region: &geo::Rect<f64>,
        fields: &[&str],
    ) -> LayerResult<Vec<AttributeRow>>;

    /// Features containing or touching `point`.
    async fn query_point(
        &self,
        point: &geo::Point<f64>,
        fields: &[&str],
    ) -> LayerResult<Vec<AttributeRow>>;
}
