//! Service layer: the panel's logic between the map's layers and its UI.
//!
//! Data flows leaf to root: [`dataset`] loads city records, [`city_features`]
//! turns them into point features, and on every stationary viewport
//! [`viewport_cycle`] runs [`query`], [`aggregator`] and [`display`] in turn.

pub mod aggregator;
pub mod city_features;
pub mod dataset;
pub mod display;
pub mod query;
pub mod stationary;
pub mod viewport_cycle;

pub use aggregator::aggregate;
pub use city_features::{build, BuildError, CityFeatureCollection};
pub use dataset::{load_city_records, DatasetError, DatasetSource, RetryPolicy};
pub use display::{apply, PanelZone, Readout, ReadoutPanel};
pub use query::{query_by_point, query_by_region, PointResolution, SpatialQueryResult};
pub use stationary::StationaryDebouncer;
pub use viewport_cycle::{CycleOutcome, DetailThreshold, PanelHandle, ViewportCycle};
