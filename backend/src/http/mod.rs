//! HTTP surface of the eclipse panel.
//!
//! Exposes the city features, the layer catalog and the read-out panel, and
//! accepts viewport notifications from the map client.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Viewport notifications, panel and layer reads          │
//! │  - CORS, compression, error handling                      │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (services/)                                │
//! │  - Stationary debouncer and viewport cycle                │
//! │  - Aggregation and display update                         │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Layer Catalog (layers/)                                  │
//! │  - In-memory GeoJSON / CSV spatial layers                 │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
