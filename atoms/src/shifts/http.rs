use lambda_http::{http::StatusCode, Body, Error, Response};
use super::model::{CreateShiftPayload, UpdateNotesPayload};
use super::service::{self, ShiftStore, StoreError};
use crate::respond::{error_response, json_response};

/// GET /shifts - never fails; an unreadable store yields []
pub async fn list_shifts_handler(store: &dyn ShiftStore) -> Result<Response<Body>, Error> {
    let shifts = service::list_shifts(store).await;
    json_response(StatusCode::OK, &shifts)
}

/// POST /shifts
pub async fn create_shift_handler(store: &dyn ShiftStore, body: &[u8]) -> Result<Response<Body>, Error> {
    let payload: CreateShiftPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("Rejected shift body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid request body: {}", e));
        }
    };

    match service::create_shift(store, payload).await {
        Ok(shift) => json_response(StatusCode::CREATED, &shift),
        Err(StoreError::InvalidShift(msg)) => error_response(StatusCode::BAD_REQUEST, &msg),
        Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not add shift."),
    }
}

/// PATCH /shifts/{id}/notes
pub async fn update_notes_handler(
    store: &dyn ShiftStore,
    shift_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateNotesPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid request body: {}", e));
        }
    };

    match service::update_shift_notes(store, shift_id, &payload.notes).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "id": shift_id, "notes": payload.notes }),
        ),
        Err(StoreError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "Could not update notes."),
        Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not update notes."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shifts::MemoryShiftStore;

    fn body_json(resp: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(resp.body().as_ref()).unwrap()
    }

    const NEW_SHIFT: &str = r#"{
        "client": {"id": "1", "name": "Eleanor Vance"},
        "caregiverName": "Ada Byron",
        "startTime": "2024-01-01T09:00:00.000Z",
        "endTime": "2024-01-01T11:30:00.000Z",
        "completedTasks": [{"id": 1, "text": "Medication Reminder", "completed": true},
                           {"id": 3, "text": "Personal Care", "completed": true}],
        "incompleteTasks": [{"id": 2, "label": "Meal Preparation"},
                            {"id": 4, "label": "Light Housekeeping"},
                            {"id": 5, "label": "Companionship"},
                            {"id": 6, "label": "Mobility Assistance"}],
        "notes": ""
    }"#;

    #[tokio::test]
    async fn create_list_and_patch_round_trip_over_http() {
        let store = MemoryShiftStore::new();

        let created = create_shift_handler(&store, NEW_SHIFT.as_bytes()).await.unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let id = body_json(&created)["id"].as_str().unwrap().to_string();

        let patched = update_notes_handler(&store, &id, br#"{"notes":"Ate well"}"#).await.unwrap();
        assert_eq!(patched.status(), StatusCode::OK);

        let listed = list_shifts_handler(&store).await.unwrap();
        let shifts = body_json(&listed);
        assert_eq!(shifts[0]["notes"], "Ate well");
        assert_eq!(shifts[0]["caregiverName"], "Ada Byron");
    }

    #[tokio::test]
    async fn bad_bodies_are_400() {
        let store = MemoryShiftStore::new();
        let resp = create_shift_handler(&store, b"{not json").await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let partial = NEW_SHIFT.replace(r#"{"id": 6, "label": "Mobility Assistance"}"#, r#"{"id": 5, "label": "Companionship"}"#);
        let resp = create_shift_handler(&store, partial.as_bytes()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stored_record_ignores_caller_supplied_labels() {
        let store = MemoryShiftStore::new();
        let tampered = NEW_SHIFT
            .replace(r#""text": "Medication Reminder", "completed": true"#, r#""text": "Juggling", "completed": false"#)
            .replace(r#""label": "Meal Preparation""#, r#""label": "x", "completed": true"#)
            .replace(r#""name": "Eleanor Vance""#, r#""name": "Somebody Else""#);

        let created = create_shift_handler(&store, tampered.as_bytes()).await.unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let shifts = body_json(&list_shifts_handler(&store).await.unwrap());
        assert_eq!(shifts[0]["client"]["name"], "Eleanor Vance");
        assert_eq!(shifts[0]["completedTasks"][0]["label"], "Medication Reminder");
        assert_eq!(shifts[0]["completedTasks"][0]["completed"], true);
        assert_eq!(shifts[0]["incompleteTasks"][0]["completed"], false);
    }

    #[tokio::test]
    async fn reversed_window_is_400() {
        let store = MemoryShiftStore::new();
        let backwards = NEW_SHIFT.replace("T11:30:00.000Z", "T08:00:00.000Z");
        let resp = create_shift_handler(&store, backwards.as_bytes()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&resp)["error"], "Shift ends before it starts");
    }

    #[tokio::test]
    async fn patching_missing_shift_reports_failure() {
        let store = MemoryShiftStore::new();
        let resp = update_notes_handler(&store, "ghost", br#"{"notes":"x"}"#).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(&resp)["error"], "Could not update notes.");
    }
}
