use chrono::{DateTime, Utc};
use std::fmt;

/// One timestamped GPS sample decoded from an IGC B-record.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    /// Signed decimal degrees, north positive.
    pub latitude: f64,
    /// Signed decimal degrees, east positive.
    pub longitude: f64,
    /// Absolute UTC instant (IGC times are UTC by spec).
    pub timestamp: DateTime<Utc>,
    pub gps_altitude: Option<i32>,
    pub pressure_altitude: Option<i32>,
}

impl Fix {
    /// Barometric altitude when the recorder logged one, GPS altitude otherwise.
    pub fn preferred_altitude(&self) -> Option<i32> {
        self.pressure_altitude.or(self.gps_altitude)
    }
}

/// Free-text metadata parsed opportunistically from H-records.
///
/// Every field is optional: a missing or mangled header never fails a parse,
/// it just stays `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackHeaders {
    pub pilot: Option<String>,
    pub glider_type: Option<String>,
    pub glider_id: Option<String>,
    pub competition_id: Option<String>,
    pub site: Option<String>,
    pub recorder: Option<String>,
}

/// Decoded IGC track: fixes in file order plus whatever metadata was present.
#[derive(Debug, Clone, Default)]
pub struct ParsedTrack {
    pub fixes: Vec<Fix>,
    pub headers: TrackHeaders,
    /// Free text of the task declaration (C-record), when one was flown.
    pub task_name: Option<String>,
}

/// Derived flight metrics. Every field is optional so a track that parses but
/// cannot support a given metric still yields a usable record; an all-`None`
/// value is the "processed, nothing to show" outcome for tracks with fewer
/// than two fixes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightMetrics {
    pub location: Option<String>,
    pub duration_seconds: Option<i64>,
    pub distance_meters: Option<i64>,
    pub altitude_max_meters: Option<i64>,
    /// TODO: FAI triangle distance needs a turnpoint optimizer; the field
    /// stays so downstream display code has a stable shape.
    pub fai_distance_meters: Option<i64>,
    /// Same value as `distance_meters`, kept distinct for display code that
    /// labels the two differently.
    pub track_length_meters: Option<i64>,
    pub avg_speed_kmh: Option<f64>,
    pub max_alt_gain_meters: Option<i64>,
    pub max_climb_ms: Option<f64>,
    pub max_sink_ms: Option<f64>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

impl FlightMetrics {
    /// True when derivation produced nothing, i.e. the track was unusable.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug)]
pub enum IgcProcessError {
    /// The input contained no decodable B-records at all. Individual bad
    /// lines are skipped silently; this fires only for a total loss.
    NoFixes,
}

impl fmt::Display for IgcProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgcProcessError::NoFixes => {
                write!(f, "no decodable position fixes found in IGC input")
            }
        }
    }
}

impl std::error::Error for IgcProcessError {}
