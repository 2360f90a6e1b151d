use serde::{Deserialize, Serialize};

use super::time::Instant;

/// Number of eclipse contact times stored per city.
pub const ECLIPSE_PHASE_COUNT: usize = 5;

/// One row of the static city timing dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityTimingRecord {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "STATE")]
    pub state: String,
    #[serde(rename = "LON")]
    pub longitude: f64,
    #[serde(rename = "LAT")]
    pub latitude: f64,
    /// UTC `HH:MM:SS` strings, first contact through last contact.
    #[serde(rename = "ECLIPSE")]
    pub eclipse_times: Vec<String>,
}

/// Eclipse phases in dataset order; the discriminant is the `t{n}` index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EclipsePhase {
    Start,
    HalfwayToMaximum,
    Maximum,
    HalfwayToEnd,
    End,
}

impl EclipsePhase {
    pub const ALL: [EclipsePhase; ECLIPSE_PHASE_COUNT] = [
        EclipsePhase::Start,
        EclipsePhase::HalfwayToMaximum,
        EclipsePhase::Maximum,
        EclipsePhase::HalfwayToEnd,
        EclipsePhase::End,
    ];

    /// Attribute name carrying this phase on a city feature.
    pub fn field_name(self) -> &'static str {
        match self {
            EclipsePhase::Start => "t0",
            EclipsePhase::HalfwayToMaximum => "t1",
            EclipsePhase::Maximum => "t2",
            EclipsePhase::HalfwayToEnd => "t3",
            EclipsePhase::End => "t4",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EclipsePhase::Start => "Start time",
            EclipsePhase::HalfwayToMaximum => "50% to maximum obscuration",
            EclipsePhase::Maximum => "Maximum obscuration",
            EclipsePhase::HalfwayToEnd => "50% to end",
            EclipsePhase::End => "End time",
        }
    }
}

/// A city as a point feature with absolute eclipse instants.
#[derive(Debug, Clone, PartialEq)]
pub struct CityFeature {
    pub name: String,
    pub state: String,
    pub point: geo::Point<f64>,
    pub times: [Instant; ECLIPSE_PHASE_COUNT],
}

impl CityFeature {
    pub fn time(&self, phase: EclipsePhase) -> Instant {
        self.times[phase as usize]
    }

    /// Attributes as exposed to the spatial layer: name, state and `t0..t4`
    /// as epoch milliseconds.
    pub fn properties(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut props = serde_json::Map::new();
        props.insert("name".into(), self.name.clone().into());
        props.insert("state".into(), self.state.clone().into());
        for phase in EclipsePhase::ALL {
            props.insert(
                phase.field_name().into(),
                self.time(phase).timestamp_millis().into(),
            );
        }
        props
    }

    pub fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
                self.point.x(),
                self.point.y(),
            ]))),
            id: None,
            properties: Some(self.properties()),
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserializes_dataset_keys() {
        let json = r#"{
            "NAME": "Dallas",
            "STATE": "TX",
            "LON": -96.797,
            "LAT": 32.7767,
            "ECLIPSE": ["17:23:00", "17:59:00", "18:40:00", "19:21:00", "20:02:00"]
        }"#;
        let record: CityTimingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Dallas");
        assert_eq!(record.state, "TX");
        assert_eq!(record.eclipse_times.len(), ECLIPSE_PHASE_COUNT);
        assert_eq!(record.longitude, -96.797);
    }

    #[test]
    fn test_phase_fields_follow_dataset_order() {
        let fields: Vec<&str> = EclipsePhase::ALL.iter().map(|p| p.field_name()).collect();
        assert_eq!(fields, vec!["t0", "t1", "t2", "t3", "t4"]);
        assert_eq!(EclipsePhase::End.label(), "End time");
    }
}
