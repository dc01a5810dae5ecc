use serde::Serialize;

/// A single sampled reading from a `<Trackpoint>`.
///
/// Both values are cumulative: `distance_meters` is the distance covered since
/// the start of the track, not since the previous point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trackpoint {
    pub distance_meters: f64,
    pub altitude_meters: i64,
}

impl Trackpoint {
    pub fn new(distance_meters: f64, altitude_meters: i64) -> Self {
        Self {
            distance_meters,
            altitude_meters,
        }
    }
}

/// One row of the leg summary table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    /// Trackpoints seen since the start of the track (one per second).
    pub total_seconds: u64,
    /// Trackpoints that belong to this leg.
    pub lap_points: u64,
    /// Sum of the distance deltas inside this leg.
    pub distance: f64,
    /// Sum of positive altitude deltas.
    pub up: i64,
    /// Sum of non-positive altitude deltas (zero or negative).
    pub down: i64,
}
