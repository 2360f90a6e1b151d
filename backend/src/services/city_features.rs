//! Builds point features from the city timing dataset.

use crate::models::{
    CityFeature, CityTimingRecord, EventDate, Instant, MalformedTimeError, ECLIPSE_PHASE_COUNT,
};

/// Dataset integrity failure; aborts the whole build.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("city #{index} ({name}) has {found} eclipse times, expected 5")]
    MissingTimes {
        index: usize,
        name: String,
        found: usize,
    },

    #[error("city #{index} ({name}): {source}")]
    MalformedTime {
        index: usize,
        name: String,
        #[source]
        source: MalformedTimeError,
    },
}

/// City features in dataset order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityFeatureCollection {
    features: Vec<CityFeature>,
}

impl CityFeatureCollection {
    pub fn features(&self) -> &[CityFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: None,
            features: self.features.iter().map(CityFeature::to_geojson).collect(),
            foreign_members: None,
        }
    }
}

/// Convert every record into a [`CityFeature`] on `date`.
///
/// Only the first five eclipse times are used. A record with fewer, or with a
/// malformed time, fails the build.
pub fn build(
    records: &[CityTimingRecord],
    date: EventDate,
) -> Result<CityFeatureCollection, BuildError> {
    let mut features = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if record.eclipse_times.len() < ECLIPSE_PHASE_COUNT {
            return Err(BuildError::MissingTimes {
                index,
                name: record.name.clone(),
                found: record.eclipse_times.len(),
            });
        }

        let mut times: [Instant; ECLIPSE_PHASE_COUNT] = [Instant::default(); ECLIPSE_PHASE_COUNT];
        for (slot, raw) in times.iter_mut().zip(&record.eclipse_times) {
            *slot = date
                .instant_at(raw)
                .map_err(|source| BuildError::MalformedTime {
                    index,
                    name: record.name.clone(),
                    source,
                })?;
        }

        features.push(CityFeature {
            name: record.name.clone(),
            state: record.state.clone(),
            point: geo::Point::new(record.longitude, record.latitude),
            times,
        });
    }

    log::info!("Built {} city feature(s) for {}", features.len(), date);
    Ok(CityFeatureCollection { features })
}
