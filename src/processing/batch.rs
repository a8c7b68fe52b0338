//! Batch enrichment of stored-but-unprocessed tracks.

use crate::processing::types::FlightMetrics;
use crate::processing::process_igc;
use uuid::Uuid;

/// A stored track awaiting metrics, as handed over by the persistence layer.
#[derive(Debug, Clone)]
pub struct PendingTrack {
    pub id: Uuid,
    pub raw_igc: String,
}

/// Per-item result of a batch run. `metrics` may be the all-absent value for
/// tracks that failed to parse or were too short; the item still counts as
/// processed.
#[derive(Debug, Clone)]
pub struct ProcessedTrack {
    pub id: Uuid,
    pub metrics: FlightMetrics,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Items attempted, not items successfully enriched; the caller uses
    /// this to decide whether to ask for another batch.
    pub attempted: usize,
    pub results: Vec<ProcessedTrack>,
}

/// Run parse + derive over a batch of pending tracks.
///
/// Items are independent and processed fail-soft: a garbage track yields
/// empty metrics for that item and never aborts the rest.
pub fn process_batch(pending: Vec<PendingTrack>) -> BatchOutcome {
    let attempted = pending.len();
    let results = pending
        .into_iter()
        .map(|item| {
            let metrics = process_igc(&item.raw_igc);
            if metrics.is_empty() {
                tracing::debug!(id = %item.id, "track yielded no metrics");
            }
            ProcessedTrack {
                id: item.id,
                metrics,
            }
        })
        .collect();

    BatchOutcome { attempted, results }
}
