//! Flight metrics derivation from a parsed track.
//!
//! Pure transformation: a [`ParsedTrack`] in, a [`FlightMetrics`] out. A
//! track with fewer than two fixes yields the all-absent default, a valid
//! "nothing to show" outcome rather than an error.

use crate::processing::geo::{Coordinate, haversine_distance_m};
use crate::processing::types::{FlightMetrics, ParsedTrack};

/// Sliding window length for vertical-speed estimation.
const VARIO_WINDOW_SECS: f64 = 3.0;
/// Minimum elapsed time inside the window before a rate is computed; keeps
/// tightly spaced samples from blowing up the division.
const VARIO_MIN_SPAN_SECS: f64 = 1.5;
/// Minimum spacing for the pairwise fallback pass.
const VARIO_FALLBACK_MIN_SPAN_SECS: f64 = 0.8;
/// Rates at or beyond this magnitude are sensor noise, not flying.
const VARIO_OUTLIER_MS: f64 = 15.0;

pub fn derive_flight_metrics(track: &ParsedTrack) -> FlightMetrics {
    let fixes = &track.fixes;
    let (Some(start), Some(end)) = (fixes.first(), fixes.last()) else {
        return FlightMetrics::default();
    };
    if fixes.len() < 2 {
        return FlightMetrics::default();
    }

    let duration_seconds = (end.timestamp - start.timestamp).num_seconds().max(0);

    let mut distance = 0.0;
    for pair in fixes.windows(2) {
        let a = Coordinate {
            lat: pair[0].latitude,
            lon: pair[0].longitude,
        };
        let b = Coordinate {
            lat: pair[1].latitude,
            lon: pair[1].longitude,
        };
        distance += haversine_distance_m(a, b);
    }
    let distance_meters = distance.round() as i64;

    let altitude_max_meters = fixes
        .iter()
        .filter_map(|fix| fix.preferred_altitude())
        .max()
        .map(i64::from);

    // Parallel (seconds-from-start, altitude) series for the altitude-based
    // passes. Fixes without a usable altitude still counted for distance and
    // duration above; they just drop out of this series.
    let series: Vec<(f64, f64)> = fixes
        .iter()
        .filter_map(|fix| {
            fix.preferred_altitude().map(|alt| {
                let elapsed = (fix.timestamp - start.timestamp).num_milliseconds() as f64 / 1000.0;
                (elapsed, f64::from(alt))
            })
        })
        .collect();

    let max_alt_gain_meters = max_altitude_gain(&series);
    let (max_climb_ms, max_sink_ms) = vertical_speed_extremes(&series);

    // Average speed uses the rounded distance figure so the two displayed
    // values stay consistent with each other.
    let avg_speed_kmh = if duration_seconds > 0 {
        Some(round2(distance_meters as f64 / duration_seconds as f64 * 3.6))
    } else {
        None
    };

    FlightMetrics {
        location: Some(resolve_location(track)),
        duration_seconds: Some(duration_seconds),
        distance_meters: Some(distance_meters),
        altitude_max_meters,
        // FAI triangle scoring is not implemented; see FlightMetrics.
        fai_distance_meters: None,
        track_length_meters: Some(distance_meters),
        avg_speed_kmh,
        max_alt_gain_meters: Some(max_alt_gain_meters),
        max_climb_ms,
        max_sink_ms,
        start_at: Some(start.timestamp),
        end_at: Some(end.timestamp),
    }
}

/// Ordered fallback chain for the location label: declared site, then task
/// name, then the first fix formatted as "lat, lon".
fn resolve_location(track: &ParsedTrack) -> String {
    for candidate in [&track.headers.site, &track.task_name] {
        if let Some(name) = candidate {
            let name = name.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    let first = &track.fixes[0];
    format!("{:.4}, {:.4}", first.latitude, first.longitude)
}

/// Largest climb from any preceding local minimum, not just from the start
/// altitude. Single pass over the series tracking the running minimum.
fn max_altitude_gain(series: &[(f64, f64)]) -> i64 {
    let mut best = 0.0f64;
    let mut running_min = f64::INFINITY;
    for &(_, altitude) in series {
        running_min = running_min.min(altitude);
        best = best.max(altitude - running_min);
    }
    best.round() as i64
}

/// Windowed vertical-speed extremes with outlier rejection.
///
/// For each sample the window start is advanced until the span is at most
/// [`VARIO_WINDOW_SECS`]; spans shorter than [`VARIO_MIN_SPAN_SECS`] are
/// skipped, and rates at or above [`VARIO_OUTLIER_MS`] in magnitude are
/// discarded as noise. When the windowed pass accepts nothing (short tracks,
/// everything rejected) a pairwise pass with a relaxed spacing bound runs
/// instead.
fn vertical_speed_extremes(series: &[(f64, f64)]) -> (Option<f64>, Option<f64>) {
    let mut max_climb: Option<f64> = None;
    let mut max_sink: Option<f64> = None;

    let mut window_start = 0;
    for i in 0..series.len() {
        while window_start < i && series[i].0 - series[window_start].0 > VARIO_WINDOW_SECS {
            window_start += 1;
        }
        let elapsed = series[i].0 - series[window_start].0;
        if elapsed < VARIO_MIN_SPAN_SECS {
            continue;
        }
        let rate = (series[i].1 - series[window_start].1) / elapsed;
        accept_rate(rate, &mut max_climb, &mut max_sink);
    }

    if max_climb.is_none() && max_sink.is_none() {
        for pair in series.windows(2) {
            let elapsed = pair[1].0 - pair[0].0;
            if elapsed < VARIO_FALLBACK_MIN_SPAN_SECS {
                continue;
            }
            let rate = (pair[1].1 - pair[0].1) / elapsed;
            accept_rate(rate, &mut max_climb, &mut max_sink);
        }
    }

    (max_climb.map(round2), max_sink.map(round2))
}

fn accept_rate(rate: f64, max_climb: &mut Option<f64>, max_sink: &mut Option<f64>) {
    if !rate.is_finite() || rate.abs() >= VARIO_OUTLIER_MS {
        return;
    }
    *max_climb = Some(max_climb.map_or(rate, |current| current.max(rate)));
    *max_sink = Some(max_sink.map_or(rate, |current| current.min(rate)));
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
