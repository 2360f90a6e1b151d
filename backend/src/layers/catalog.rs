//! Layer catalog for the eclipse map.
//!
//! Resolves `[[layers]]` definitions into queryable layers and attaches a
//! popup template to every layer whose kind supports one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::{ErrorContext, LayerError, LayerResult};
use super::memory::InMemoryLayer;
use super::{LayerKind, SpatialLayer};
use crate::models::EclipsePhase;

pub const CITY_TIMES_LAYER: &str = "city-times";
pub const PENUMBRA_LAYER: &str = "penumbra";
pub const DURATION_LAYER: &str = "duration";

/// Where a layer's features come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LayerSource {
    /// GeoJSON or CSV file, resolved against the config directory.
    File { path: PathBuf },
    /// Generated from the city timing dataset at startup.
    CityTimes,
    /// Rendered entirely by the mapping SDK; no queryable features.
    Tiles { style: String },
}

/// One `[[layers]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    pub title: String,
    pub kind: LayerKind,
    pub source: LayerSource,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// A field shown in a feature popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupField {
    pub field_name: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupTemplate {
    pub title: String,
    pub fields: Vec<PopupField>,
}

impl PopupTemplate {
    /// Title plus one row per attribute, labelled with the field name.
    pub fn generated(title: &str, fields: &[String]) -> Self {
        Self {
            title: title.to_string(),
            fields: fields
                .iter()
                .map(|f| PopupField {
                    field_name: f.clone(),
                    label: f.clone(),
                    date_format: None,
                })
                .collect(),
        }
    }

    /// Replace the generated content with the five eclipse phases.
    pub fn with_eclipse_phases(mut self) -> Self {
        self.fields = EclipsePhase::ALL
            .iter()
            .map(|phase| PopupField {
                field_name: phase.field_name().to_string(),
                label: phase.label().to_string(),
                date_format: Some("short-date-short-time".to_string()),
            })
            .collect();
        self
    }
}

/// A loaded layer with its display metadata.
#[derive(Clone)]
pub struct LayerEntry {
    pub spec: LayerSpec,
    pub layer: Arc<dyn SpatialLayer>,
    pub popup: Option<PopupTemplate>,
}

/// Layers in draw order, bottom first.
#[derive(Clone, Default)]
pub struct LayerCatalog {
    entries: Vec<LayerEntry>,
}

impl LayerCatalog {
    /// Load every layer in `specs`.
    ///
    /// File sources are read relative to `base_dir`. `city_times` supplies the
    /// features for the layer whose source is [`LayerSource::CityTimes`].
    pub fn load(
        specs: &[LayerSpec],
        base_dir: &Path,
        city_times: &geojson::FeatureCollection,
    ) -> LayerResult<Self> {
        let mut entries = Vec::with_capacity(specs.len());

        for spec in specs {
            let layer = load_layer(spec, base_dir, city_times)?;
            let popup = if spec.kind.supports_auto_popup() {
                let generated = PopupTemplate::generated(&spec.title, &layer.fields());
                Some(match spec.source {
                    LayerSource::CityTimes => generated.with_eclipse_phases(),
                    _ => generated,
                })
            } else {
                None
            };

            log::info!(
                "Loaded layer '{}' ({:?}, {} field(s))",
                spec.id,
                spec.kind,
                layer.fields().len()
            );
            entries.push(LayerEntry {
                spec: spec.clone(),
                layer: Arc::new(layer),
                popup,
            });
        }

        Ok(Self { entries })
    }

    /// Build a catalog from already-loaded layers.
    pub fn from_entries(entries: Vec<LayerEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LayerEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn SpatialLayer>> {
        self.entries
            .iter()
            .find(|e| e.spec.id == id)
            .map(|e| Arc::clone(&e.layer))
    }

    /// Like [`get`](Self::get) but a missing layer is an error.
    pub fn require(&self, id: &str) -> LayerResult<Arc<dyn SpatialLayer>> {
        self.get(id).ok_or_else(|| {
            LayerError::not_found(format!("Layer '{}' is not in the catalog", id))
                .with_operation("require_layer")
        })
    }
}

fn load_layer(
    spec: &LayerSpec,
    base_dir: &Path,
    city_times: &geojson::FeatureCollection,
) -> LayerResult<InMemoryLayer> {
    match (&spec.source, spec.kind) {
        (LayerSource::CityTimes, LayerKind::GeoJson) => {
            InMemoryLayer::from_feature_collection(&spec.id, &spec.title, city_times.clone())
        }
        (LayerSource::File { path }, LayerKind::GeoJson) => {
            let text = read_source(spec, &base_dir.join(path))?;
            InMemoryLayer::from_geojson_str(&spec.id, &spec.title, &text)
        }
        (LayerSource::File { path }, LayerKind::Csv) => {
            let text = read_source(spec, &base_dir.join(path))?;
            InMemoryLayer::from_csv_reader(&spec.id, &spec.title, text.as_bytes())
        }
        (LayerSource::Tiles { .. }, LayerKind::Basemap) => Ok(InMemoryLayer::new(
            &spec.id,
            &spec.title,
            LayerKind::Basemap,
        )),
        (source, kind) => Err(LayerError::configuration(format!(
            "Layer '{}': source {:?} cannot back a {:?} layer",
            spec.id, source, kind
        ))),
    }
}

fn read_source(spec: &LayerSpec, path: &Path) -> LayerResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        LayerError::load(
            format!("Failed to read {}: {}", path.display(), e),
            ErrorContext::new("read_source").with_layer(spec.id.clone()),
        )
    })
}

/// The layer set of the eclipse map, bottom first.
pub fn default_specs() -> Vec<LayerSpec> {
    let file = |id: &str, title: &str, kind, path: &str, visible| LayerSpec {
        id: id.to_string(),
        title: title.to_string(),
        kind,
        source: LayerSource::File { path: path.into() },
        visible,
    };

    vec![
        LayerSpec {
            id: "basemap".to_string(),
            title: "Topographic".to_string(),
            kind: LayerKind::Basemap,
            source: LayerSource::Tiles {
                style: "topo-vector".to_string(),
            },
            visible: true,
        },
        file(PENUMBRA_LAYER, "Penumbra", LayerKind::GeoJson, "data/penumbra.geojson", false),
        file(DURATION_LAYER, "Duration", LayerKind::GeoJson, "data/duration.geojson", false),
        file("totality", "Totality", LayerKind::GeoJson, "data/totality.geojson", true),
        file("center", "Center", LayerKind::GeoJson, "data/center.geojson", true),
        file(
            "cloud-cover",
            "Chance of Sunny Skies in April",
            LayerKind::Csv,
            "data/cloud-cover.csv",
            false,
        ),
        file("festivals", "Festivals", LayerKind::Csv, "data/festivals.csv", false),
        LayerSpec {
            id: CITY_TIMES_LAYER.to_string(),
            title: "City Eclipse Times".to_string(),
            kind: LayerKind::GeoJson,
            source: LayerSource::CityTimes,
            visible: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn empty_cities() -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        }
    }

    #[test]
    fn test_basemap_has_no_popup() {
        let specs = vec![default_specs().remove(0)];
        let catalog = LayerCatalog::load(&specs, Path::new("."), &empty_cities()).unwrap();
        let entry = &catalog.entries()[0];
        assert_eq!(entry.layer.kind(), LayerKind::Basemap);
        assert!(entry.popup.is_none());
    }

    #[test]
    fn test_city_times_popup_lists_phases() {
        let specs: Vec<LayerSpec> = default_specs()
            .into_iter()
            .filter(|s| s.id == CITY_TIMES_LAYER)
            .collect();
        let catalog = LayerCatalog::load(&specs, Path::new("."), &empty_cities()).unwrap();
        let popup = catalog.entries()[0].popup.clone().unwrap();
        assert_eq!(popup.title, "City Eclipse Times");
        assert_eq!(popup.fields.len(), 5);
        assert_eq!(popup.fields[2].label, "Maximum obscuration");
        assert_eq!(popup.fields[4].field_name, "t4");
    }

    #[test]
    fn test_file_layer_gets_generated_popup() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("festivals.csv")).unwrap();
        writeln!(file, "NAME,LAT,LON\nStarfest,44.5,-73.2").unwrap();

        let specs = vec![LayerSpec {
            id: "festivals".into(),
            title: "Festivals".into(),
            kind: LayerKind::Csv,
            source: LayerSource::File {
                path: "festivals.csv".into(),
            },
            visible: false,
        }];
        let catalog = LayerCatalog::load(&specs, dir.path(), &empty_cities()).unwrap();
        let popup = catalog.entries()[0].popup.clone().unwrap();
        let names: Vec<&str> = popup.fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, vec!["NAME", "LAT", "LON"]);
        assert!(catalog.get("festivals").is_some());
    }

    #[test]
    fn test_missing_layer_and_bad_pairing() {
        let catalog = LayerCatalog::default();
        assert!(matches!(
            catalog.require(DURATION_LAYER),
            Err(LayerError::NotFound { .. })
        ));

        let specs = vec![LayerSpec {
            id: "odd".into(),
            title: "Odd".into(),
            kind: LayerKind::Csv,
            source: LayerSource::CityTimes,
            visible: true,
        }];
        assert!(LayerCatalog::load(&specs, Path::new("."), &empty_cities()).is_err());
    }
}
