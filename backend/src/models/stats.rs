use serde::{Deserialize, Serialize};

use super::time::Instant;

/// Summary of the eclipse as seen from the current viewport.
///
/// A field is `None` exactly when the query feeding it came back empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub average_start_time: Option<Instant>,
    pub average_end_time: Option<Instant>,
    pub obscuration_percent: Option<u8>,
    pub duration_seconds: Option<u64>,
}

impl AggregateStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
