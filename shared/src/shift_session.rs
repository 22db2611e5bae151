use crate::sessions::SessionHandle;
use carelog_atoms::respond::{error_response, json_response};
use carelog_atoms::session::{resolve_start_time, ShiftView, StartShiftPayload, UpdateSessionNotesPayload};
use carelog_atoms::shifts::{ShiftStore, StoreError};
use chrono::{DateTime, FixedOffset, Utc};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    caregiver_name: Option<String>,
    company_name: Option<String>,
    signed_in_at: DateTime<Utc>,
    shift: ShiftView,
}

async fn respond_with_view(session: &SessionHandle, status: StatusCode, now: DateTime<Utc>) -> Result<Response<Body>, Error> {
    let session = session.lock().await;
    json_response(
        status,
        &SessionView {
            caregiver_name: session.caregiver_name.clone(),
            company_name: session.company_name.clone(),
            signed_in_at: session.opened_at,
            shift: session.shift.view(now),
        },
    )
}

/// GET /session
pub async fn session_view(session: &SessionHandle, now: DateTime<Utc>) -> Result<Response<Body>, Error> {
    respond_with_view(session, StatusCode::OK, now).await
}

/// POST /shift/start
pub async fn start_shift(
    session: &SessionHandle,
    body: &[u8],
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    let payload: StartShiftPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid request body: {}", e));
        }
    };
    let started_at = resolve_start_time(payload.date, payload.time, offset, now);

    let started = session.lock().await.shift.start_shift(&payload.client_id, started_at);
    if started {
        tracing::info!(client_id = %payload.client_id, %started_at, "Shift started");
    }
    respond_with_view(session, StatusCode::OK, now).await
}

/// POST /shift/tasks/{id}/toggle
pub async fn toggle_task(session: &SessionHandle, task_id: &str, now: DateTime<Utc>) -> Result<Response<Body>, Error> {
    let Ok(task_id) = task_id.parse::<u32>() else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid task id");
    };
    session.lock().await.shift.toggle_task(task_id);
    respond_with_view(session, StatusCode::OK, now).await
}

/// PUT /shift/notes
pub async fn set_notes(session: &SessionHandle, body: &[u8], now: DateTime<Utc>) -> Result<Response<Body>, Error> {
    let payload: UpdateSessionNotesPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid request body: {}", e));
        }
    };
    session.lock().await.shift.set_notes(&payload.notes);
    respond_with_view(session, StatusCode::OK, now).await
}

/// POST /shift/end - persists the record, then shows the summary
pub async fn end_shift(
    session: &SessionHandle,
    store: &dyn ShiftStore,
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    {
        let mut guard = session.lock().await;
        let caregiver_name = guard.caregiver_name.clone();
        match guard.shift.end_shift(store, now, caregiver_name).await {
            Ok(Some(shift)) => tracing::info!(shift_id = %shift.id, "Shift ended"),
            Ok(None) => {}
            Err(StoreError::InvalidShift(msg)) => {
                tracing::warn!("Ended shift was rejected: {}", msg);
                return error_response(StatusCode::BAD_REQUEST, &msg);
            }
            Err(e) => {
                tracing::error!("Failed to save ended shift: {}", e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not add shift.");
            }
        }
    }
    respond_with_view(session, StatusCode::OK, now).await
}

/// POST /shift/new
pub async fn start_new_shift(session: &SessionHandle, now: DateTime<Utc>) -> Result<Response<Body>, Error> {
    session.lock().await.shift.start_new_shift();
    respond_with_view(session, StatusCode::OK, now).await
}
