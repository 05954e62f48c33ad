//! Pointer picking against the visible markers.
//!
//! A query is a pure read of the current [`MarkerSet`]; it can be run on every
//! pointer move without accumulating state.

use crate::geo::GeoRecord;
use crate::sync::{Marker, MarkerSet};
use crate::view::{GlobeFrame, PerspectiveCamera};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use glam::DVec2;

/// Placeholder shown for missing fields.
pub const PLACEHOLDER: &str = "N/A";

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Display-ready fields of a hovered marker.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    pub identifier: String,
    pub coordinates: String,
    pub status: &'static str,
    pub time: String,
    /// Distance from the camera to the hit.
    pub distance: f64,
}

impl HoverInfo {
    pub fn from_record(record: &GeoRecord, distance: f64) -> Self {
        Self::from_record_in(record, distance, &Local)
    }

    pub fn from_record_in<Tz>(record: &GeoRecord, distance: f64, zone: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            identifier: record.identifier().unwrap_or(PLACEHOLDER).to_string(),
            coordinates: format!("{:.2}, {:.2}", record.latitude, record.longitude),
            status: record.category().label(),
            time: record
                .timestamp()
                .map(|raw| format_timestamp_in(raw, zone))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            distance,
        }
    }

    /// Overlay text, one field per line.
    pub fn lines(&self) -> [String; 4] {
        [
            format!("IP: {}", self.identifier),
            format!("Coordinates: {}", self.coordinates),
            format!("Status: {}", self.status),
            format!("Time: {}", self.time),
        ]
    }
}

/// Outcome of a hover query.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverTarget {
    /// Nothing visible under the pointer.
    Nothing,
    Marker(HoverInfo),
}

impl HoverTarget {
    pub fn info(&self) -> Option<&HoverInfo> {
        match self {
            HoverTarget::Nothing => None,
            HoverTarget::Marker(info) => Some(info),
        }
    }
}

/// Returns the nearest visible marker along the camera ray through `ndc`.
///
/// Hidden markers are not candidates at all.
pub fn pick<'a>(
    markers: &'a MarkerSet,
    frame: &GlobeFrame,
    camera: &PerspectiveCamera,
    ndc: DVec2,
) -> Option<(&'a Marker, f64)> {
    let ray = camera.ray_from_ndc(ndc);
    let rotation = frame.matrix();

    markers
        .visible()
        .filter_map(|marker| {
            ray.intersect_sphere(rotation * marker.position(), marker.size())
                .map(|distance| (marker, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Picks and formats in one step.
pub fn query(
    markers: &MarkerSet,
    frame: &GlobeFrame,
    camera: &PerspectiveCamera,
    ndc: DVec2,
) -> HoverTarget {
    match pick(markers, frame, camera, ndc) {
        Some((marker, distance)) => HoverTarget::Marker(HoverInfo::from_record(marker.record(), distance)),
        None => HoverTarget::Nothing,
    }
}

/// Renders a timestamp for humans, falling back to the raw text.
pub fn format_timestamp(raw: &str) -> String {
    format_timestamp_in(raw, &Local)
}

pub fn format_timestamp_in<Tz>(raw: &str, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return parsed.with_timezone(zone).format(DISPLAY_FORMAT).to_string();
    }

    // Offset-less timestamps are wall-clock values; show them as written.
    NAIVE_FORMATS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(trimmed, pattern).ok())
        .map(|naive| naive.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}
