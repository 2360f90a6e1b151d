//! # Eclipse Panel
//!
//! Viewport-driven read-outs for the 2024-04-08 total solar eclipse map.
//!
//! Every time the map view settles, the crate queries the visible city
//! timing features plus the penumbra and duration layers at the view
//! center, aggregates them, and writes four read-outs to a panel: average
//! start time, average end time, obscuration and totality duration.
//!
//! ## Architecture
//!
//! - [`models`]: Time parsing, city features, viewport and aggregate types
//! - [`layers`]: Spatial layer trait, in-memory GeoJSON/CSV layers, catalog
//! - [`services`]: Feature builder, aggregator, display updater, debouncer
//!   and the viewport cycle tying them together
//! - [`config`]: `eclipse.toml` plus environment overrides
//! - [`http`]: Axum-based HTTP server and request handlers

// LayerError carries its ErrorContext inline
#![allow(clippy::result_large_err)]

pub mod config;
pub mod layers;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
