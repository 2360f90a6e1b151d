//! Application state for the HTTP server.

use anyhow::Context;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::PanelConfig;
use crate::layers::LayerCatalog;
use crate::services::dataset::{fetcher_for, load_city_records};
use crate::services::viewport_cycle::spawn_stationary_driver;
use crate::services::{build, ReadoutPanel, StationaryDebouncer, ViewportCycle};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<LayerCatalog>,
    /// City features as served by `GET /v1/cities`.
    pub cities: Arc<geojson::FeatureCollection>,
    pub cycle: ViewportCycle,
    pub debouncer: StationaryDebouncer,
}

impl AppState {
    pub fn new(
        catalog: Arc<LayerCatalog>,
        cities: Arc<geojson::FeatureCollection>,
        cycle: ViewportCycle,
        debouncer: StationaryDebouncer,
    ) -> Self {
        Self {
            catalog,
            cities,
            cycle,
            debouncer,
        }
    }

    /// Load the dataset and layers described by `config` and start the
    /// stationary driver.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn initialize(config: &PanelConfig) -> anyhow::Result<Self> {
        let source = config.dataset_source();
        let fetcher = fetcher_for(&source, &config.base_dir, config.fetch_timeout())?;
        let records = load_city_records(fetcher.as_ref(), &config.retry_policy())
            .await
            .with_context(|| format!("loading city dataset from {}", fetcher.describe()))?;

        let features = build(&records, config.event.date)?;
        let cities = features.to_geojson();

        let catalog = LayerCatalog::load(&config.layers, &config.base_dir, &cities)
            .context("loading map layers")?;

        let zone = config.panel_zone()?;
        log::info!("Rendering read-outs in {}", zone.name());
        let panel = Arc::new(RwLock::new(ReadoutPanel::new(zone)));
        let cycle = ViewportCycle::from_catalog(
            &catalog,
            config.viewport.threshold,
            config.viewport.point_resolution,
            panel,
        )?;

        let (debouncer, settled) = StationaryDebouncer::spawn(config.stationary_quiet());
        spawn_stationary_driver(cycle.clone(), settled);

        log::info!(
            "Initialized {} city feature(s) and {} layer(s)",
            features.len(),
            catalog.entries().len()
        );
        Ok(Self::new(Arc::new(catalog), Arc::new(cities), cycle, debouncer))
    }
}
