//! Display Updater.
//!
//! Maps [`AggregateStats`] onto the read-out panel: four labelled chips that
//! can each be shown or hidden, and a "zoom in for results" notice.

use chrono::FixedOffset;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::{AggregateStats, Instant};

/// Chip value of a hidden read-out.
pub const UNKNOWN: &str = "unknown";

/// A single labelled chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readout {
    pub label: String,
    pub hidden: bool,
    pub text: String,
    pub value: String,
}

impl Readout {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            hidden: true,
            text: String::new(),
            value: UNKNOWN.to_string(),
        }
    }

    fn show(&mut self, text: String) {
        self.hidden = false;
        self.value = text.clone();
        self.text = text;
    }

    fn hide(&mut self) {
        self.hidden = true;
        self.text.clear();
        self.value = UNKNOWN.to_string();
    }

    fn set(&mut self, text: Option<String>) {
        match text {
            Some(text) => self.show(text),
            None => self.hide(),
        }
    }
}

/// Timezone the read-outs are rendered in.
///
/// A named zone applies the offset in force at each instant, so eclipse-day
/// times keep their daylight-saving rule whatever the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Default for PanelZone {
    fn default() -> Self {
        PanelZone::Named(Tz::UTC)
    }
}

impl PanelZone {
    /// The host zone: `TZ` if it names an IANA zone, then the system setting,
    /// then UTC.
    pub fn host() -> Self {
        let from_env = std::env::var("TZ")
            .ok()
            .and_then(|name| name.trim_start_matches(':').parse::<Tz>().ok());
        if let Some(tz) = from_env {
            return PanelZone::Named(tz);
        }

        match iana_time_zone::get_timezone() {
            Ok(name) => match name.parse::<Tz>() {
                Ok(tz) => PanelZone::Named(tz),
                Err(_) => {
                    log::warn!("Unknown host timezone '{}', using UTC", name);
                    PanelZone::default()
                }
            },
            Err(e) => {
                log::warn!("Could not determine host timezone ({}), using UTC", e);
                PanelZone::default()
            }
        }
    }

    /// IANA name, or `UTC±HH:MM` for a fixed offset.
    pub fn name(&self) -> String {
        match self {
            PanelZone::Named(tz) => tz.name().to_string(),
            PanelZone::Fixed(offset) => format!("UTC{}", offset),
        }
    }

    fn format(&self, instant: Instant, fmt: &str) -> String {
        match self {
            PanelZone::Named(tz) => instant.with_timezone(tz).format(fmt).to_string(),
            PanelZone::Fixed(offset) => instant.with_timezone(offset).format(fmt).to_string(),
        }
    }
}

/// UI state of the query results panel, owned by the composition root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadoutPanel {
    pub start_time: Readout,
    pub end_time: Readout,
    pub obscuration: Readout,
    pub duration: Readout,
    pub zoom_notice_visible: bool,
    /// e.g. "America/Chicago timezone"
    pub description: String,
    #[serde(skip)]
    zone: PanelZone,
}

impl ReadoutPanel {
    /// Empty panel rendering times in `zone`.
    pub fn new(zone: PanelZone) -> Self {
        Self {
            start_time: Readout::new("Start time"),
            end_time: Readout::new("End time"),
            obscuration: Readout::new("Obscuration"),
            duration: Readout::new("Duration"),
            zoom_notice_visible: false,
            description: format!("{} timezone", zone.name()),
            zone,
        }
    }

    /// 12-hour clock time in the panel's timezone, e.g. "1:42:07 PM".
    pub fn format_time(&self, instant: Instant) -> String {
        self.zone.format(instant, "%-I:%M:%S %p")
    }

    fn readouts_mut(&mut self) -> [&mut Readout; 4] {
        [
            &mut self.start_time,
            &mut self.end_time,
            &mut self.obscuration,
            &mut self.duration,
        ]
    }
}

/// Apply `stats` to the panel.
///
/// When the view is zoomed out past the detail threshold every read-out is
/// hidden and the zoom notice shown, whatever `stats` holds.
pub fn apply(panel: &mut ReadoutPanel, stats: &AggregateStats, viewport_zoom_sufficient: bool) {
    if !viewport_zoom_sufficient {
        panel.zoom_notice_visible = true;
        for readout in panel.readouts_mut() {
            readout.hide();
        }
        return;
    }

    panel.zoom_notice_visible = false;
    let start = stats.average_start_time.map(|t| panel.format_time(t));
    let end = stats.average_end_time.map(|t| panel.format_time(t));
    panel.start_time.set(start);
    panel.end_time.set(end);
    panel
        .obscuration
        .set(stats.obscuration_percent.map(|p| format!("{}%", p)));
    panel
        .duration
        .set(stats.duration_seconds.map(|s| format!("{} seconds", s)));
}
