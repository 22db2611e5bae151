use carelog_atoms::catalog::CatalogResponse;
use carelog_atoms::respond::{error_response, json_response};
use carelog_atoms::shifts::{create_shift_handler, list_shifts_handler, update_notes_handler};
use carelog_shared::{proxy, shift_session, AppState};
use chrono::{DateTime, Utc};
use lambda_http::{
    http::{
        header::{HeaderValue, VARY},
        Method, StatusCode,
    },
    Body, Error, Request, RequestExt, Response,
};
use reports_block::reports;
use reports_block::types::ReportQuery;
use std::sync::Arc;

fn with_cors_headers(mut resp: Response<Body>, allowed_origin: &str, request_origin: Option<&str>) -> Response<Body> {
    // Credentials cannot be combined with a literal "*", so echo the caller instead
    let origin = match (allowed_origin, request_origin) {
        ("*", Some(requested)) => requested,
        (configured, _) => configured,
    };

    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert("Access-Control-Allow-Credentials", HeaderValue::from_static("true"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Accept,Cookie"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn not_found() -> Result<Response<Body>, Error> {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn method_not_allowed() -> Result<Response<Body>, Error> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

fn query_param(event: &Request, key: &str) -> Option<String> {
    event
        .query_string_parameters_ref()
        .and_then(|params| params.first(key))
        .map(|v| v.to_string())
}

/// `caregiver` may be an on-call EmployeeID when CustomerID and Pin ride along
async fn report_query(event: &Request, state: &AppState) -> ReportQuery {
    let customer_id = query_param(event, "CustomerID");
    let pin = query_param(event, "Pin");
    let caregiver = proxy::resolve_report_caregiver(
        &state.upstream,
        query_param(event, "caregiver"),
        customer_id.as_deref(),
        pin.as_deref(),
    )
    .await;

    ReportQuery {
        client_id: query_param(event, "clientId"),
        caregiver,
        week: query_param(event, "week"),
    }
}

/// Main Lambda handler - routes every /api request
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let route = path.strip_prefix("/api").unwrap_or(path);
    let body: &[u8] = event.body().as_ref();
    let request_origin = event.headers().get("Origin").and_then(|v| v.to_str().ok());
    let allowed_origin = state.config.cors_allowed_origin.as_str();
    let now = Utc::now();
    tracing::info!("{} {}", method, path);

    if method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, allowed_origin, request_origin));
    }

    let parts: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    let store = state.store.as_ref();
    let settings = &state.config.report;

    let resp = match (method, parts.as_slice()) {
        (&Method::POST, ["login"]) => proxy::login(&state.upstream, &state.sessions, event.headers(), body, now).await,
        (&Method::POST, ["logout"]) => proxy::logout(&state.sessions, event.headers()).await,
        (&Method::GET, ["caregivers"]) => {
            let customer_id = query_param(&event, "CustomerID");
            let pin = query_param(&event, "Pin");
            proxy::on_call_caregivers(&state.upstream, customer_id.as_deref(), pin.as_deref()).await
        }

        (_, ["session"]) | (_, ["shift", ..]) => session_routes(&event, &state, &parts, now).await,

        (&Method::GET, ["catalog"]) => json_response(StatusCode::OK, &CatalogResponse::current()),

        (&Method::GET, ["shifts"]) => list_shifts_handler(store).await,
        (&Method::POST, ["shifts"]) => create_shift_handler(store, body).await,
        (&Method::DELETE, ["shifts"]) => reports::clear_all_data(store).await,
        (&Method::PATCH, ["shifts", shift_id, "notes"]) => update_notes_handler(store, shift_id, body).await,

        (&Method::GET, ["reports", "weeks"]) => reports::list_weeks(settings, now).await,
        (&Method::GET, ["reports", "weekly"]) => {
            let query = report_query(&event, &state).await;
            reports::weekly_report(store, settings, &query, now).await
        }
        (&Method::GET, ["reports", "weekly", "pdf"]) => {
            let query = report_query(&event, &state).await;
            reports::export_pdf(store, settings, &query, now).await
        }

        (
            _,
            ["login"] | ["logout"] | ["caregivers"] | ["catalog"] | ["shifts"] | ["shifts", _, "notes"]
            | ["reports", "weeks"] | ["reports", "weekly"] | ["reports", "weekly", "pdf"],
        ) => method_not_allowed(),

        _ => {
            tracing::warn!("No route matched - Method: {} Path: {}", method, path);
            not_found()
        }
    };

    resp.map(|r| with_cors_headers(r, allowed_origin, request_origin))
}

/// Routes that act on the caller's own shift tracker
async fn session_routes(
    event: &Request,
    state: &AppState,
    parts: &[&str],
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    let Some(session) = state.sessions.from_headers(event.headers(), now).await else {
        tracing::warn!("Rejected {} without a valid session", event.uri().path());
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    };
    let body: &[u8] = event.body().as_ref();

    match (event.method(), parts) {
        (&Method::GET, ["session"]) => shift_session::session_view(&session, now).await,
        (&Method::POST, ["shift", "start"]) => {
            shift_session::start_shift(&session, body, state.config.report.offset, now).await
        }
        (&Method::POST, ["shift", "tasks", task_id, "toggle"]) => {
            shift_session::toggle_task(&session, task_id, now).await
        }
        (&Method::PUT, ["shift", "notes"]) => shift_session::set_notes(&session, body, now).await,
        (&Method::POST, ["shift", "end"]) => {
            shift_session::end_shift(&session, state.store.as_ref(), now).await
        }
        (&Method::POST, ["shift", "new"]) => shift_session::start_new_shift(&session, now).await,
        (_, ["session"] | ["shift", "start"] | ["shift", "notes"] | ["shift", "end"] | ["shift", "new"]) => {
            method_not_allowed()
        }
        _ => not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelog_shared::config::Config;
    use carelog_atoms::shifts::MemoryShiftStore;
    use lambda_http::http::header::{COOKIE, SET_COOKIE};
    use std::collections::HashMap;

    fn state() -> Arc<AppState> {
        let config = Config::from_lookup(|key| match key {
            "UPSTREAM_BASE_URL" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        });
        Arc::new(AppState::with_store(config, Arc::new(MemoryShiftStore::new())))
    }

    fn request(method: &str, uri: &str, body: &str) -> Request {
        lambda_http::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("Origin", "https://app.example.com")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn with_cookie(mut req: Request, token: &str) -> Request {
        req.headers_mut()
            .insert(COOKIE, format!("carelog_session={}", token).parse().unwrap());
        req
    }

    fn body_json(resp: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(resp.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn preflight_carries_cors() {
        let resp = function_handler(request("OPTIONS", "/api/shifts", ""), state()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "https://app.example.com");
        assert_eq!(resp.headers()["Access-Control-Allow-Credentials"], "true");
    }

    #[tokio::test]
    async fn catalog_lists_tasks_and_clients() {
        let resp = function_handler(request("GET", "/api/catalog", ""), state()).await.unwrap();
        let catalog = body_json(&resp);
        assert_eq!(catalog["tasks"].as_array().unwrap().len(), 6);
        assert_eq!(catalog["clients"][0]["name"], "Eleanor Vance");
    }

    #[tokio::test]
    async fn tracker_requires_a_session() {
        let resp = function_handler(request("POST", "/api/shift/start", r#"{"clientId":"1"}"#), state())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(&resp)["error"], "Unauthorized");
        assert!(resp.headers().contains_key("Access-Control-Allow-Origin"));
    }

    #[tokio::test]
    async fn shift_ended_in_the_tracker_shows_up_in_reports() {
        let state = state();
        let token = state.sessions.open(Some("Ada Byron".to_string()), None, Utc::now()).await;

        let start = with_cookie(request("POST", "/api/shift/start", r#"{"clientId":"1"}"#), &token);
        let resp = function_handler(start, state.clone()).await.unwrap();
        assert_eq!(body_json(&resp)["shift"]["state"], "active");

        let toggle = with_cookie(request("POST", "/api/shift/tasks/2/toggle", ""), &token);
        function_handler(toggle, state.clone()).await.unwrap();

        let end = with_cookie(request("POST", "/api/shift/end", ""), &token);
        let resp = function_handler(end, state.clone()).await.unwrap();
        assert_eq!(body_json(&resp)["shift"]["state"], "summary");

        let resp = function_handler(request("GET", "/api/shifts", ""), state.clone()).await.unwrap();
        let shifts = body_json(&resp);
        assert_eq!(shifts.as_array().unwrap().len(), 1);
        assert_eq!(shifts[0]["completedTasks"][0]["id"], 2);

        let weekly = request("GET", "/api/reports/weekly", "").with_query_string_parameters(HashMap::from([
            ("clientId".to_string(), "1".to_string()),
            ("caregiver".to_string(), "all".to_string()),
        ]));
        let resp = function_handler(weekly, state.clone()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(&resp)["shifts"].as_array().unwrap().len(), 1);

        let resp = function_handler(request("DELETE", "/api/shifts", ""), state.clone()).await.unwrap();
        assert_eq!(body_json(&resp)["deleted"], 1);
    }

    #[tokio::test]
    async fn notes_edit_on_missing_shift_is_not_found() {
        let req = request("PATCH", "/api/shifts/nope/notes", r#"{"notes":"x"}"#);
        let resp = function_handler(req, state()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let state = state();
        let token = state.sessions.open(None, None, Utc::now()).await;
        let resp = function_handler(with_cookie(request("POST", "/api/logout", ""), &token), state.clone())
            .await
            .unwrap();
        assert!(resp.headers()[SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

        let view = with_cookie(request("GET", "/api/session", ""), &token);
        let resp = function_handler(view, state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_routes_and_methods() {
        let resp = function_handler(request("GET", "/api/nowhere", ""), state()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = function_handler(request("PUT", "/api/catalog", ""), state()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
