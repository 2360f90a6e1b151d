//! Data Transfer Objects for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::layers::{LayerEntry, LayerKind, PopupTemplate};
use crate::models::{Extent, LonLat, ViewportSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of city features loaded at startup
    pub cities: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDto {
    pub id: String,
    pub title: String,
    pub kind: LayerKind,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup: Option<PopupTemplate>,
}

impl From<&LayerEntry> for LayerDto {
    fn from(entry: &LayerEntry) -> Self {
        Self {
            id: entry.spec.id.clone(),
            title: entry.spec.title.clone(),
            kind: entry.spec.kind,
            visible: entry.spec.visible,
            popup: entry.popup.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerListResponse {
    pub layers: Vec<LayerDto>,
    pub total: usize,
}

/// Viewport as reported by the map client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportRequest {
    pub extent: Extent,
    pub center: LonLat,
    pub scale: f64,
    pub zoom: f64,
}

impl ViewportRequest {
    /// Reject non-finite values and inverted extents.
    pub fn validate(self) -> Result<ViewportSnapshot, String> {
        let Extent {
            xmin,
            ymin,
            xmax,
            ymax,
        } = self.extent;
        let numbers = [
            xmin,
            ymin,
            xmax,
            ymax,
            self.center.lon,
            self.center.lat,
            self.scale,
            self.zoom,
        ];
        if numbers.iter().any(|n| !n.is_finite()) {
            return Err("Viewport values must be finite numbers".to_string());
        }
        if xmin > xmax || ymin > ymax {
            return Err(format!(
                "Invalid extent: ({}, {}) to ({}, {})",
                xmin, ymin, xmax, ymax
            ));
        }
        if self.scale <= 0.0 {
            return Err(format!("Scale must be positive, got {}", self.scale));
        }

        Ok(ViewportSnapshot {
            extent: self.extent,
            center: self.center,
            scale: self.scale,
            zoom: self.zoom,
        })
    }
}

/// Response to a debounced viewport notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportAccepted {
    pub message: String,
    /// Quiet window before the cycle runs
    pub quiet_ms: u64,
}
