pub mod processing;
pub mod store;
pub mod templates;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use processing::batch::process_batch;
use processing::validate_track;
use store::{FlightStore, InsertOutcome};
use templates::{render_flight_detail, render_flight_list, render_landing_page};

/// Upper bound on tracks enriched per `/flights/process` call; clients poll
/// until `attempted` comes back zero.
pub const PROCESS_BATCH_SIZE: usize = 50;

#[derive(Clone, Default)]
pub struct AppState {
    pub store: Arc<FlightStore>,
}

pub fn build_app() -> Router {
    build_app_with_state(AppState::default())
}

pub fn build_app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/upload", post(handle_upload))
        .route("/flights", get(list_flights))
        .route("/flights/process", post(process_flights))
        .route("/flights/status", get(flight_status))
        .route("/flights/stats", get(flight_stats))
        .route("/flights/:id", get(flight_detail).delete(delete_flight))
        .route("/flights/:id/download", get(download_flight))
        .with_state(state)
}

async fn landing_page() -> Html<String> {
    Html(render_landing_page())
}

#[derive(Debug, Default, Serialize)]
struct UploadSummary {
    created: usize,
    skipped_duplicates: usize,
    rejected: usize,
}

async fn handle_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut summary = UploadSummary::default();
    let mut saw_file = false;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        saw_file = true;

        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "track.igc".to_string());
        let Ok(content) = field.text().await else {
            summary.rejected += 1;
            continue;
        };

        match validate_track(&filename, &content) {
            Ok(track) => match state.store.insert(track) {
                InsertOutcome::Created(id) => {
                    tracing::info!(%id, filename = %filename, "stored uploaded track");
                    summary.created += 1;
                }
                InsertOutcome::Duplicate => {
                    tracing::debug!(filename = %filename, "skipping duplicate upload");
                    summary.skipped_duplicates += 1;
                }
            },
            Err(err) => {
                tracing::debug!(filename = %filename, %err, "rejecting upload");
                summary.rejected += 1;
            }
        }
    }

    if !saw_file {
        return (StatusCode::BAD_REQUEST, "No file provided").into_response();
    }
    Json(summary).into_response()
}

#[derive(Debug, Serialize)]
struct ProcessSummary {
    attempted: usize,
}

async fn process_flights(State(state): State<AppState>) -> Json<ProcessSummary> {
    let pending = state.store.take_unprocessed(PROCESS_BATCH_SIZE);
    let outcome = process_batch(pending);
    for result in outcome.results {
        state.store.apply_metrics(result.id, result.metrics);
    }
    tracing::info!(attempted = outcome.attempted, "processed flight batch");
    Json(ProcessSummary {
        attempted: outcome.attempted,
    })
}

#[derive(Debug, Serialize)]
struct StatusSummary {
    pending: usize,
    processed: usize,
}

async fn flight_status(State(state): State<AppState>) -> Json<StatusSummary> {
    let (pending, processed) = state.store.counts();
    Json(StatusSummary { pending, processed })
}

async fn flight_stats(State(state): State<AppState>) -> Json<store::FlightStatsReport> {
    Json(state.store.stats())
}

#[derive(Debug, Serialize)]
struct DeleteSummary {
    ok: bool,
}

async fn delete_flight(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if state.store.remove(id) {
        tracing::info!(%id, "deleted flight");
        Json(DeleteSummary { ok: true }).into_response()
    } else {
        (StatusCode::NOT_FOUND, "No such flight").into_response()
    }
}

async fn list_flights(State(state): State<AppState>) -> Html<String> {
    Html(render_flight_list(&state.store.list()))
}

async fn flight_detail(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.store.get(id) {
        Some(flight) => Html(render_flight_detail(&flight)).into_response(),
        None => (StatusCode::NOT_FOUND, "No such flight").into_response(),
    }
}

/// Serve the original upload verbatim; the core never rewrites raw IGC.
async fn download_flight(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.store.get(id) {
        Some(flight) => (
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", flight.filename),
                ),
            ],
            flight.raw_igc,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "No such flight").into_response(),
    }
}
