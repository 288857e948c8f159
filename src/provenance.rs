//! Provenance marker — a constant synthetic geotag that identifies library
//! entries created by this tool. The coordinates are deliberately implausible
//! (a point in the open Pacific with a 111 km altitude) so they never collide
//! with a real GPS fix.

use serde::{Deserialize, Serialize};

/// Geographic tag attached to a library entry.
///
/// Field set mirrors what a device location fix carries; only a subset takes
/// part in the marker equality check (see [`GeoTag::is_marker`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTag {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub horizontal_accuracy: f64,
    pub vertical_accuracy: f64,
    pub course: f64,
    pub course_accuracy: f64,
    pub speed: f64,
    pub speed_accuracy: f64,
    /// Reference timestamp, seconds since the Unix epoch.
    pub timestamp: i64,
}

/// The marker written to every asset this tool creates.
pub const MARKER: GeoTag = GeoTag {
    latitude: 3.2170717,
    longitude: -126.9294551,
    altitude: 111_111.0,
    horizontal_accuracy: 111.0,
    vertical_accuracy: 111.0,
    course: 111.0,
    course_accuracy: 111.0,
    speed: 111.0,
    speed_accuracy: 111.0,
    timestamp: 111,
};

impl GeoTag {
    /// Exact equality against the marker constant.
    ///
    /// Compares latitude, longitude, altitude, both accuracies and course —
    /// bitwise floating-point equality, no tolerance. Speed and timestamp are
    /// not part of the check.
    pub fn is_marker(&self) -> bool {
        self.latitude == MARKER.latitude
            && self.longitude == MARKER.longitude
            && self.altitude == MARKER.altitude
            && self.horizontal_accuracy == MARKER.horizontal_accuracy
            && self.vertical_accuracy == MARKER.vertical_accuracy
            && self.course == MARKER.course
    }
}
