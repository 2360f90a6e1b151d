use geo::{coord, Point, Rect};
use serde::{Deserialize, Serialize};

/// Current state of the map view as reported by the mapping SDK.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSnapshot {
    pub extent: Extent,
    pub center: LonLat,
    /// Map scale denominator (1:scale).
    pub scale: f64,
    pub zoom: f64,
}

/// Longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/// Axis-aligned viewport bounds in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// `Rect::new` normalizes the corners, so swapped bounds are tolerated.
    pub fn to_rect(self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.xmin, y: self.ymin },
            coord! { x: self.xmax, y: self.ymax },
        )
    }
}

impl ViewportSnapshot {
    pub fn region(&self) -> Rect<f64> {
        self.extent.to_rect()
    }

    pub fn center_point(&self) -> Point<f64> {
        self.center.to_point()
    }
}
