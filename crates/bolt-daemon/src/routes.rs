//! Axum router and all HTTP handlers for bolt-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers, so tests can drive the bare router.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use bolt_engine::RequestOutcome;

use crate::{
    api_types::{
        ErrorResponse, HealthResponse, LockDetailResponse, LockListResponse, SetTargetRequest,
        SetTargetResponse, TargetResponse,
    },
    state::{uptime_secs, AppState, BusMsg, LockEntry},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/locks", get(list_locks))
        .route("/v1/locks/:device_id", get(get_lock))
        .route("/v1/locks/:device_id/target", get(get_target).post(set_target))
        .route("/v1/stream", get(stream))
        .with_state(state)
}

fn not_found(device_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("LOCK_NOT_FOUND: no lock with device_id '{device_id}'"),
        }),
    )
        .into_response()
}

fn lookup<'a>(st: &'a AppState, device_id: &str) -> Result<&'a LockEntry, Response> {
    st.lock(device_id).ok_or_else(|| not_found(device_id))
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            uptime_secs: uptime_secs(),
            locks: st.locks.len(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/locks
// ---------------------------------------------------------------------------

pub(crate) async fn list_locks(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let locks = st
        .locks
        .values()
        .map(|entry| entry.accessory.snapshot())
        .collect();
    (StatusCode::OK, Json(LockListResponse { locks }))
}

// ---------------------------------------------------------------------------
// GET /v1/locks/:device_id
// ---------------------------------------------------------------------------

pub(crate) async fn get_lock(
    State(st): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Response {
    let entry = match lookup(&st, &device_id) {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };

    let controller = entry.controller.snapshot().await;
    (
        StatusCode::OK,
        Json(LockDetailResponse {
            accessory: entry.accessory.snapshot(),
            controller,
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/locks/:device_id/target
// ---------------------------------------------------------------------------

pub(crate) async fn get_target(
    State(st): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Response {
    let entry = match lookup(&st, &device_id) {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };

    let target = entry.controller.current_target().await;
    (StatusCode::OK, Json(TargetResponse { device_id, target })).into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/locks/:device_id/target
// ---------------------------------------------------------------------------

/// `202` when a command was dispatched (convergence pending), `200` when
/// coalesced, retargeted or accepted after its session ended, `502` when
/// the device rejected the command.
pub(crate) async fn set_target(
    State(st): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    Json(req): Json<SetTargetRequest>,
) -> Response {
    let entry = match lookup(&st, &device_id) {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };

    let outcome = entry.controller.request_target(req.target).await;
    let status = match &outcome {
        RequestOutcome::Dispatched { .. } => StatusCode::ACCEPTED,
        RequestOutcome::DispatchFailed { .. } => StatusCode::BAD_GATEWAY,
        RequestOutcome::Coalesced
        | RequestOutcome::Retargeted { .. }
        | RequestOutcome::AcceptedAfterEnd { .. } => StatusCode::OK,
    };
    let body = SetTargetResponse::from_outcome(&device_id, req.target, &outcome);

    info!(device_id = %device_id, target = %req.target, outcome = %body.outcome, "locks/target");
    let level = if status == StatusCode::BAD_GATEWAY { "WARN" } else { "INFO" };
    let _ = st.bus.send(BusMsg::LogLine {
        level: level.to_string(),
        msg: format!("{device_id} set-target {} -> {}", req.target, body.outcome),
    });

    (status, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let events = bus_events(st.bus.subscribe());
    let sse = Sse::new(events).keep_alive(KeepAlive::new());
    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        sse,
    )
        .into_response()
}

/// Lagged receivers skip the missed messages rather than ending the stream.
fn bus_events(rx: broadcast::Receiver<BusMsg>) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        let msg = msg.ok()?;
        let event = Event::default()
            .event(msg.event_name())
            .json_data(&msg)
            .ok()?;
        Some(Ok(event))
    })
}
