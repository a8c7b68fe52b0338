pub mod batch;
pub mod fingerprint;
pub mod geo;
pub mod parse;
pub mod summary;
pub mod types;

use fingerprint::content_fingerprint;
use parse::parse_igc;
use summary::derive_flight_metrics;

pub use types::{Fix, FlightMetrics, IgcProcessError, ParsedTrack, TrackHeaders};

/// Turn raw IGC text into flight metrics, fail-soft.
///
/// Two stages:
/// 1. [`parse::parse_igc`] decodes fixes and header metadata, skipping
///    malformed lines.
/// 2. [`summary::derive_flight_metrics`] walks the fixes for duration,
///    distance, altitude and vertical-speed figures.
///
/// A track that fails to parse (or parses to fewer than two fixes) comes
/// back as the all-absent [`FlightMetrics`] rather than an error, so one bad
/// track can never abort a processing batch.
pub fn process_igc(raw: &str) -> FlightMetrics {
    match parse_igc(raw) {
        Ok(track) => derive_flight_metrics(&track),
        Err(err) => {
            tracing::debug!(%err, "treating unparseable track as empty metrics");
            FlightMetrics::default()
        }
    }
}

/// An upload that survived validation, ready for the store.
#[derive(Debug, Clone)]
pub struct ValidTrack {
    pub filename: String,
    pub raw_igc: String,
    pub content_fingerprint: String,
}

/// Upload-time validation: the text must parse as IGC at all, otherwise the
/// file is rejected outright. Valid content gets its dedup fingerprint
/// attached; the raw text is kept verbatim for later download.
pub fn validate_track(filename: &str, content: &str) -> Result<ValidTrack, IgcProcessError> {
    parse_igc(content)?;
    Ok(ValidTrack {
        filename: filename.to_string(),
        raw_igc: content.to_string(),
        content_fingerprint: content_fingerprint(content),
    })
}
