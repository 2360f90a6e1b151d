//! One aggregate-and-display cycle per stationary viewport.
//!
//! Gate on the detail threshold, query the city-times, penumbra and duration
//! layers one after another, aggregate, then write the panel. Overlapping
//! cycles are not cancelled: whichever writes the panel last wins.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::aggregator::aggregate;
use super::display::{apply, ReadoutPanel};
use super::query::{instants, query_by_point, query_by_region, PointResolution};
use crate::layers::catalog::{CITY_TIMES_LAYER, DURATION_LAYER, PENUMBRA_LAYER};
use crate::layers::{LayerCatalog, LayerResult, SpatialLayer};
use crate::models::{AggregateStats, EclipsePhase, ViewportSnapshot};

pub const OBSCURATION_FIELD: &str = "Obscuration";
pub const DURATION_FIELD: &str = "Duration";

/// Shared panel state; last writer wins.
pub type PanelHandle = Arc<RwLock<ReadoutPanel>>;

/// Zoom/scale cutoff below which detail queries are suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum DetailThreshold {
    /// Sufficient while the scale denominator is strictly below the value.
    MaxScale(f64),
    /// Sufficient while the zoom level is at or above the value.
    MinZoom(f64),
}

impl Default for DetailThreshold {
    fn default() -> Self {
        DetailThreshold::MaxScale(1_000_000.0)
    }
}

impl DetailThreshold {
    pub fn is_sufficient(&self, viewport: &ViewportSnapshot) -> bool {
        match *self {
            DetailThreshold::MaxScale(max) => viewport.scale < max,
            DetailThreshold::MinZoom(min) => viewport.zoom >= min,
        }
    }
}

/// Result of a single cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleOutcome {
    pub cycle_id: Uuid,
    /// `None` when the zoom gate suppressed the queries.
    pub stats: Option<AggregateStats>,
    pub panel: ReadoutPanel,
}

/// The layers and settings a cycle needs.
#[derive(Clone)]
pub struct ViewportCycle {
    city_times: Arc<dyn SpatialLayer>,
    penumbra: Arc<dyn SpatialLayer>,
    duration: Arc<dyn SpatialLayer>,
    threshold: DetailThreshold,
    point_resolution: PointResolution,
    panel: PanelHandle,
}

impl ViewportCycle {
    pub fn new(
        city_times: Arc<dyn SpatialLayer>,
        penumbra: Arc<dyn SpatialLayer>,
        duration: Arc<dyn SpatialLayer>,
        threshold: DetailThreshold,
        point_resolution: PointResolution,
        panel: PanelHandle,
    ) -> Self {
        Self {
            city_times,
            penumbra,
            duration,
            threshold,
            point_resolution,
            panel,
        }
    }

    /// Wire the cycle to the city-times, penumbra and duration catalog layers.
    pub fn from_catalog(
        catalog: &LayerCatalog,
        threshold: DetailThreshold,
        point_resolution: PointResolution,
        panel: PanelHandle,
    ) -> LayerResult<Self> {
        Ok(Self::new(
            catalog.require(CITY_TIMES_LAYER)?,
            catalog.require(PENUMBRA_LAYER)?,
            catalog.require(DURATION_LAYER)?,
            threshold,
            point_resolution,
            panel,
        ))
    }

    pub fn panel(&self) -> PanelHandle {
        Arc::clone(&self.panel)
    }

    /// Query and aggregate without touching the panel.
    ///
    /// Returns `Ok(None)` when the viewport is zoomed out past the threshold;
    /// no layer is queried in that case.
    pub async fn compute(&self, viewport: &ViewportSnapshot) -> LayerResult<Option<AggregateStats>> {
        if !self.threshold.is_sufficient(viewport) {
            return Ok(None);
        }

        let start_field = EclipsePhase::Start.field_name();
        let end_field = EclipsePhase::End.field_name();
        let cities = query_by_region(
            self.city_times.as_ref(),
            &viewport.region(),
            &[start_field, end_field],
        )
        .await?;

        let center = viewport.center_point();
        let penumbra = query_by_point(self.penumbra.as_ref(), &center, &[OBSCURATION_FIELD]).await?;
        let duration = query_by_point(self.duration.as_ref(), &center, &[DURATION_FIELD]).await?;

        Ok(Some(aggregate(
            &instants(&cities, start_field),
            &instants(&cities, end_field),
            self.point_resolution.resolve(&penumbra, OBSCURATION_FIELD),
            self.point_resolution.resolve(&duration, DURATION_FIELD),
        )))
    }

    /// Run a full cycle and write the result to the panel.
    ///
    /// A failed query leaves the panel as it was.
    pub async fn run(&self, viewport: &ViewportSnapshot) -> LayerResult<CycleOutcome> {
        let cycle_id = Uuid::new_v4();
        let stats = self.compute(viewport).await.map_err(|e| {
            log::warn!("cycle {}: query failed: {}", cycle_id, e);
            e
        })?;

        let panel = {
            let mut panel = self.panel.write();
            match &stats {
                Some(stats) => apply(&mut panel, stats, true),
                None => apply(&mut panel, &AggregateStats::default(), false),
            }
            panel.clone()
        };

        match &stats {
            Some(stats) => log::info!("cycle {}: updated panel with {:?}", cycle_id, stats),
            None => log::info!(
                "cycle {}: scale {} / zoom {} below detail threshold {:?}",
                cycle_id,
                viewport.scale,
                viewport.zoom,
                self.threshold
            ),
        }

        Ok(CycleOutcome {
            cycle_id,
            stats,
            panel,
        })
    }
}

/// Run a cycle for every settled viewport.
///
/// Each cycle is its own task, so a slow cycle does not hold up the next one.
pub fn spawn_stationary_driver(
    cycle: ViewportCycle,
    mut settled: mpsc::Receiver<ViewportSnapshot>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(viewport) = settled.recv().await {
            let cycle = cycle.clone();
            tokio::spawn(async move {
                // Errors are already logged by `run`.
                let _ = cycle.run(&viewport).await;
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Extent, LonLat};

    fn viewport(scale: f64, zoom: f64) -> ViewportSnapshot {
        ViewportSnapshot {
            extent: Extent::new(-1.0, -1.0, 1.0, 1.0),
            center: LonLat::new(0.0, 0.0),
            scale,
            zoom,
        }
    }

    #[test]
    fn test_max_scale_threshold_is_exclusive() {
        let threshold = DetailThreshold::default();
        assert!(threshold.is_sufficient(&viewport(999_999.0, 0.0)));
        assert!(!threshold.is_sufficient(&viewport(1_000_000.0, 0.0)));
    }

    #[test]
    fn test_min_zoom_threshold_is_inclusive() {
        let threshold = DetailThreshold::MinZoom(8.0);
        assert!(threshold.is_sufficient(&viewport(f64::MAX, 8.0)));
        assert!(!threshold.is_sufficient(&viewport(1.0, 7.5)));
    }

    #[test]
    fn test_threshold_config_shape() {
        let t: DetailThreshold = toml::from_str("kind = \"min-zoom\"\nvalue = 8.0").unwrap();
        assert_eq!(t, DetailThreshold::MinZoom(8.0));
    }
}
