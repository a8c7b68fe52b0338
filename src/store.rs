//! In-memory flight store: the persistence collaborator for the processing
//! core. Uploads land here unprocessed, the batch processor drains them, and
//! the web layer reads flights back out for display and download.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::processing::batch::PendingTrack;
use crate::processing::{FlightMetrics, ValidTrack};

#[derive(Debug, Clone)]
pub struct FlightRecord {
    pub id: Uuid,
    pub filename: String,
    pub raw_igc: String,
    pub content_fingerprint: String,
    pub processed: bool,
    pub metrics: FlightMetrics,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq)]
pub enum InsertOutcome {
    Created(Uuid),
    /// Same content fingerprint already stored; nothing was created.
    Duplicate,
}

/// Aggregate figures over processed flights, as shown on a pilot's logbook
/// summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlightStats {
    pub total_flights: usize,
    pub total_flight_time_seconds: i64,
    pub max_distance_meters: Option<i64>,
    pub max_duration_seconds: Option<i64>,
    pub altitude_max_meters: Option<i64>,
    pub longest_flight_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FlightStatsReport {
    pub all_time: FlightStats,
    pub current_year: FlightStats,
}

#[derive(Debug, Default)]
pub struct FlightStore {
    flights: Mutex<HashMap<Uuid, FlightRecord>>,
}

impl FlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a validated upload unless its fingerprint is already present.
    pub fn insert(&self, track: ValidTrack) -> InsertOutcome {
        let mut flights = self.lock();
        let duplicate = flights
            .values()
            .any(|record| record.content_fingerprint == track.content_fingerprint);
        if duplicate {
            return InsertOutcome::Duplicate;
        }

        let id = Uuid::new_v4();
        flights.insert(
            id,
            FlightRecord {
                id,
                filename: track.filename,
                raw_igc: track.raw_igc,
                content_fingerprint: track.content_fingerprint,
                processed: false,
                metrics: FlightMetrics::default(),
                created_at: Utc::now(),
            },
        );
        InsertOutcome::Created(id)
    }

    /// Hand out up to `limit` unprocessed tracks for a batch run. Records
    /// stay flagged unprocessed until [`apply_metrics`] lands, so a crashed
    /// batch is simply retried later.
    ///
    /// [`apply_metrics`]: FlightStore::apply_metrics
    pub fn take_unprocessed(&self, limit: usize) -> Vec<PendingTrack> {
        let flights = self.lock();
        let mut pending: Vec<&FlightRecord> =
            flights.values().filter(|record| !record.processed).collect();
        pending.sort_by_key(|record| (record.created_at, record.id));
        pending
            .into_iter()
            .take(limit)
            .map(|record| PendingTrack {
                id: record.id,
                raw_igc: record.raw_igc.clone(),
            })
            .collect()
    }

    /// Persist a batch result and mark the record processed. Empty metrics
    /// are a valid outcome; the flag flips regardless.
    pub fn apply_metrics(&self, id: Uuid, metrics: FlightMetrics) -> bool {
        let mut flights = self.lock();
        match flights.get_mut(&id) {
            Some(record) => {
                record.metrics = metrics;
                record.processed = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<FlightRecord> {
        self.lock().get(&id).cloned()
    }

    /// All flights, newest first.
    pub fn list(&self) -> Vec<FlightRecord> {
        let flights = self.lock();
        let mut records: Vec<FlightRecord> = flights.values().cloned().collect();
        records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        records
    }

    /// Drop a flight entirely. Returns false when the id is unknown.
    pub fn remove(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Logbook aggregates, all time and for the current UTC year. Only
    /// processed flights produce meaningful figures; a flight without a
    /// derived start instant falls back to its upload time for the yearly
    /// bucket.
    pub fn stats(&self) -> FlightStatsReport {
        let flights = self.lock();
        let processed: Vec<&FlightRecord> =
            flights.values().filter(|record| record.processed).collect();

        let year = Utc::now().year();
        let this_year: Vec<&FlightRecord> = processed
            .iter()
            .copied()
            .filter(|record| {
                record
                    .metrics
                    .start_at
                    .unwrap_or(record.created_at)
                    .year()
                    == year
            })
            .collect();

        FlightStatsReport {
            all_time: aggregate_stats(&processed),
            current_year: aggregate_stats(&this_year),
        }
    }

    /// (pending, processed) counts for the status endpoint.
    pub fn counts(&self) -> (usize, usize) {
        let flights = self.lock();
        let processed = flights.values().filter(|record| record.processed).count();
        (flights.len() - processed, processed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, FlightRecord>> {
        self.flights.lock().expect("flight store lock poisoned")
    }
}

fn aggregate_stats(records: &[&FlightRecord]) -> FlightStats {
    let durations = || {
        records
            .iter()
            .filter_map(|record| record.metrics.duration_seconds)
    };
    let longest_flight_id = records
        .iter()
        .filter(|record| record.metrics.duration_seconds.is_some())
        .max_by_key(|record| (record.metrics.duration_seconds, record.id))
        .map(|record| record.id);

    FlightStats {
        total_flights: records.len(),
        total_flight_time_seconds: durations().sum(),
        max_distance_meters: records
            .iter()
            .filter_map(|record| record.metrics.distance_meters)
            .max(),
        max_duration_seconds: durations().max(),
        altitude_max_meters: records
            .iter()
            .filter_map(|record| record.metrics.altitude_max_meters)
            .max(),
        longest_flight_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::validate_track;

    const RAW: &str = "HFDTE010124\r\n\
B1200004600000N00600000EA0100000000\r\n\
B1205004600540N00600000EA0150000000\r\n";

    fn valid(raw: &str) -> ValidTrack {
        validate_track("demo.igc", raw).expect("fixture validates")
    }

    #[test]
    fn duplicate_content_is_rejected_on_insert() {
        let store = FlightStore::new();
        assert!(matches!(store.insert(valid(RAW)), InsertOutcome::Created(_)));
        assert_eq!(store.insert(valid(RAW)), InsertOutcome::Duplicate);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn records_stay_pending_until_metrics_land() {
        let store = FlightStore::new();
        let InsertOutcome::Created(id) = store.insert(valid(RAW)) else {
            panic!("insert should create");
        };

        assert_eq!(store.counts(), (1, 0));
        assert_eq!(store.take_unprocessed(10).len(), 1);
        // A second drain sees the same record again until it is marked done.
        assert_eq!(store.take_unprocessed(10).len(), 1);

        assert!(store.apply_metrics(id, FlightMetrics::default()));
        assert_eq!(store.counts(), (0, 1));
        assert!(store.take_unprocessed(10).is_empty());
        assert!(store.get(id).expect("stored").processed);
    }

    #[test]
    fn take_unprocessed_respects_the_limit() {
        let store = FlightStore::new();
        // Distinct content so dedup does not collapse them.
        let other = RAW.replace("1200", "1300");
        store.insert(valid(RAW));
        store.insert(valid(&other));
        assert_eq!(store.take_unprocessed(1).len(), 1);
        assert_eq!(store.take_unprocessed(10).len(), 2);
    }

    #[test]
    fn apply_metrics_to_unknown_id_is_a_noop() {
        let store = FlightStore::new();
        assert!(!store.apply_metrics(Uuid::new_v4(), FlightMetrics::default()));
    }

    #[test]
    fn removed_flights_are_gone_from_every_view() {
        let store = FlightStore::new();
        let InsertOutcome::Created(id) = store.insert(valid(RAW)) else {
            panic!("insert should create");
        };

        assert!(store.remove(id));
        assert!(store.get(id).is_none());
        assert!(store.list().is_empty());
        assert_eq!(store.counts(), (0, 0));
        assert!(!store.remove(id));

        // Same content can be uploaded again once the old record is gone.
        assert!(matches!(store.insert(valid(RAW)), InsertOutcome::Created(_)));
    }

    #[test]
    fn stats_cover_processed_flights_only() {
        let store = FlightStore::new();
        let other = RAW.replace("1200", "1300");
        let InsertOutcome::Created(long_id) = store.insert(valid(RAW)) else {
            panic!("insert should create");
        };
        let InsertOutcome::Created(short_id) = store.insert(valid(&other)) else {
            panic!("insert should create");
        };

        // Nothing processed yet, nothing to aggregate.
        assert_eq!(store.stats().all_time, FlightStats::default());

        store.apply_metrics(
            long_id,
            FlightMetrics {
                duration_seconds: Some(3600),
                distance_meters: Some(25_000),
                altitude_max_meters: Some(2400),
                ..FlightMetrics::default()
            },
        );
        store.apply_metrics(
            short_id,
            FlightMetrics {
                duration_seconds: Some(600),
                distance_meters: Some(4_000),
                altitude_max_meters: Some(1900),
                ..FlightMetrics::default()
            },
        );

        let report = store.stats();
        assert_eq!(report.all_time.total_flights, 2);
        assert_eq!(report.all_time.total_flight_time_seconds, 4200);
        assert_eq!(report.all_time.max_distance_meters, Some(25_000));
        assert_eq!(report.all_time.max_duration_seconds, Some(3600));
        assert_eq!(report.all_time.altitude_max_meters, Some(2400));
        assert_eq!(report.all_time.longest_flight_id, Some(long_id));
        // Neither track derived a start instant, so both fall back to their
        // upload time and land in the current year.
        assert_eq!(report.current_year.total_flights, 2);
    }

    #[test]
    fn yearly_stats_bucket_by_flight_start() {
        use chrono::TimeZone;

        let store = FlightStore::new();
        let InsertOutcome::Created(id) = store.insert(valid(RAW)) else {
            panic!("insert should create");
        };
        store.apply_metrics(
            id,
            FlightMetrics {
                duration_seconds: Some(1800),
                start_at: Some(Utc.with_ymd_and_hms(2019, 6, 1, 10, 0, 0).unwrap()),
                ..FlightMetrics::default()
            },
        );

        let report = store.stats();
        assert_eq!(report.all_time.total_flights, 1);
        assert_eq!(report.current_year.total_flights, 0);
    }
}
