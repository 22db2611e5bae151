use crate::sessions::{clear_session_cookie, session_cookie, session_token, SessionRegistry};
use crate::upstream::{
    login_identity, normalize_on_call, parse_roster, passthrough_login, ProxyReply, UpstreamClient, UpstreamReply,
};
use carelog_atoms::caregivers::resolve_caregiver_name;
use carelog_atoms::respond::json_response;
use chrono::{DateTime, Utc};
use lambda_http::{
    http::{HeaderMap, HeaderValue, StatusCode},
    Body, Error, Response,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: Option<String>,
    /// Numeric or string; forwarded as given
    #[serde(default)]
    pin: Option<serde_json::Value>,
}

impl LoginRequest {
    fn credentials(&self) -> Option<(&str, &serde_json::Value)> {
        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        let pin = self.pin.as_ref().filter(|p| match p {
            serde_json::Value::String(s) => !s.trim().is_empty(),
            serde_json::Value::Number(_) => true,
            _ => false,
        })?;
        Some((email, pin))
    }
}

fn into_response(reply: ProxyReply) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(reply.status)
        .header("Content-Type", reply.content_type)
        .body(reply.body.into())
        .map_err(Box::new)?)
}

fn transport_failure(what: &str, e: reqwest::Error) -> Result<Response<Body>, Error> {
    tracing::error!("{} request failed: {}", what, e);
    into_response(ProxyReply::message(
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!("Failed to reach caregiver service: {}", e),
    ))
}

/// GET /caregivers?CustomerID=&Pin=
pub async fn on_call_caregivers(
    upstream: &UpstreamClient,
    customer_id: Option<&str>,
    pin: Option<&str>,
) -> Result<Response<Body>, Error> {
    let (Some(customer_id), Some(pin)) = (non_blank(customer_id), non_blank(pin)) else {
        return into_response(ProxyReply::message(
            StatusCode::BAD_REQUEST,
            "CustomerID and Pin are required",
        ));
    };

    match upstream.on_call(customer_id, pin).await {
        Ok(reply) => into_response(normalize_on_call(&reply)),
        Err(e) => transport_failure("On-call", e),
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|v| !v.is_empty())
}

/// Report filters may name a caregiver by on-call EmployeeID. Swap it for the
/// display name shifts carry; anything we can't resolve is left as given.
pub async fn resolve_report_caregiver(
    upstream: &UpstreamClient,
    selection: Option<String>,
    customer_id: Option<&str>,
    pin: Option<&str>,
) -> Option<String> {
    let raw = selection?;
    if raw.trim().parse::<i64>().is_err() {
        return Some(raw);
    }
    let (Some(customer_id), Some(pin)) = (non_blank(customer_id), non_blank(pin)) else {
        return Some(raw);
    };

    let roster = match upstream.on_call(customer_id, pin).await {
        Ok(reply) => parse_roster(&reply),
        Err(e) => {
            tracing::warn!("Roster lookup for report filter failed: {}", e);
            None
        }
    };
    match roster.and_then(|r| resolve_caregiver_name(&raw, &r)) {
        Some(name) => {
            tracing::info!(employee_id = %raw, "Report caregiver resolved from roster");
            Some(name)
        }
        None => Some(raw),
    }
}

/// Turn a login reply into the browser response, opening a session on success.
/// A successful login replaces whatever session the browser already held.
pub async fn finish_login(
    reply: &UpstreamReply,
    sessions: &SessionRegistry,
    previous_token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    let mut resp = into_response(passthrough_login(reply))?;

    if let Some(identity) = login_identity(reply) {
        if let Some(previous) = previous_token {
            sessions.close(previous).await;
        }
        let token = sessions
            .open(identity.caregiver_name, identity.company_name, now)
            .await;
        if let Ok(cookie) = HeaderValue::from_str(&session_cookie(&token)) {
            resp.headers_mut().append("Set-Cookie", cookie);
        }
    } else {
        tracing::info!(status = reply.status, "Login not accepted upstream");
    }

    Ok(resp)
}

/// POST /login
pub async fn login(
    upstream: &UpstreamClient,
    sessions: &SessionRegistry,
    headers: &HeaderMap,
    body: &[u8],
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    let request: Option<LoginRequest> = serde_json::from_slice(body).ok();
    let Some((email, pin)) = request.as_ref().and_then(LoginRequest::credentials) else {
        return into_response(ProxyReply::message(
            StatusCode::BAD_REQUEST,
            "Email and pin are required",
        ));
    };

    match upstream.login(email, pin).await {
        Ok(reply) => {
            let previous = session_token(headers);
            finish_login(&reply, sessions, previous.as_deref(), now).await
        }
        Err(e) => transport_failure("Login", e),
    }
}

/// POST /logout - always succeeds and always clears the cookie
pub async fn logout(sessions: &SessionRegistry, headers: &HeaderMap) -> Result<Response<Body>, Error> {
    if let Some(token) = session_token(headers) {
        sessions.close(&token).await;
    }

    let mut resp = json_response(StatusCode::OK, &serde_json::json!({ "ok": true }))?;
    if let Ok(cookie) = HeaderValue::from_str(&clear_session_cookie()) {
        resp.headers_mut().append("Set-Cookie", cookie);
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::header::COOKIE;

    fn reply(status: u16, content_type: &str, body: &str) -> UpstreamReply {
        UpstreamReply {
            status,
            status_text: "".to_string(),
            content_type: Some(content_type.to_string()),
            body: body.to_string(),
        }
    }

    #[test]
    fn numeric_and_string_pins_are_accepted() {
        let numeric: LoginRequest = serde_json::from_str(r#"{"email":"a@b.c","pin":1234}"#).unwrap();
        assert!(numeric.credentials().is_some());
        let blank: LoginRequest = serde_json::from_str(r#"{"email":"a@b.c","pin":"  "}"#).unwrap();
        assert!(blank.credentials().is_none());
        let missing: LoginRequest = serde_json::from_str(r#"{"pin":"1"}"#).unwrap();
        assert!(missing.credentials().is_none());
    }

    #[tokio::test]
    async fn report_caregiver_falls_back_to_the_selection() {
        let upstream = UpstreamClient::new("http://127.0.0.1:9");
        let pick = |s: &str| Some(s.to_string());

        assert_eq!(resolve_report_caregiver(&upstream, None, Some("c"), Some("1")).await, None);
        assert_eq!(
            resolve_report_caregiver(&upstream, pick("Ada Byron"), Some("c"), Some("1")).await,
            pick("Ada Byron")
        );
        assert_eq!(
            resolve_report_caregiver(&upstream, pick("17"), None, Some("1")).await,
            pick("17")
        );
        // roster unreachable
        assert_eq!(
            resolve_report_caregiver(&upstream, pick("17"), Some("c"), Some("1")).await,
            pick("17")
        );
    }

    #[tokio::test]
    async fn login_requires_credentials() {
        let upstream = UpstreamClient::new("http://127.0.0.1:9");
        let sessions = SessionRegistry::new();
        let resp = login(&upstream, &sessions, &HeaderMap::new(), br#"{"email":""}"#, Utc::now()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(resp.body().as_ref()).unwrap();
        assert_eq!(body["message"], "Email and pin are required");

        let resp = login(&upstream, &sessions, &HeaderMap::new(), b"not json", Utc::now()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn on_call_requires_both_parameters() {
        let upstream = UpstreamClient::new("http://127.0.0.1:9");
        let resp = on_call_caregivers(&upstream, Some("42"), None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn successful_login_opens_a_session() {
        let sessions = SessionRegistry::new();
        let body = r#"{"MyName":"Ada Byron","companyName":"FirstLight"}"#;
        let resp = finish_login(&reply(200, "application/json", body), &sessions, None, Utc::now())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body().as_ref(), body.as_bytes());
        let cookie = resp.headers()["Set-Cookie"].to_str().unwrap();
        assert!(cookie.starts_with("carelog_session="));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie.split(';').next().unwrap().parse().unwrap());
        let session = sessions.from_headers(&headers, Utc::now()).await.unwrap();
        assert_eq!(session.lock().await.caregiver_name.as_deref(), Some("Ada Byron"));
    }

    #[tokio::test]
    async fn rejected_login_passes_through_without_session() {
        let sessions = SessionRegistry::new();
        let resp = finish_login(&reply(401, "text/plain", "Wrong PIN"), &sessions, None, Utc::now())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.body().as_ref(), b"Wrong PIN");
        assert!(resp.headers().get("Set-Cookie").is_none());
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn logging_in_again_replaces_the_old_session() {
        let sessions = SessionRegistry::new();
        let old = sessions.open(Some("Ada Byron".to_string()), None, Utc::now()).await;
        let ok = reply(200, "application/json", r#"{"MyName":"Ada Byron"}"#);

        finish_login(&ok, &sessions, Some(&old), Utc::now()).await.unwrap();
        assert!(sessions.get(&old, Utc::now()).await.is_none());
        assert_eq!(sessions.len().await, 1);

        // a refused login leaves the existing session alone
        let current = sessions.open(None, None, Utc::now()).await;
        let refused = reply(401, "text/plain", "Wrong PIN");
        finish_login(&refused, &sessions, Some(&current), Utc::now()).await.unwrap();
        assert!(sessions.get(&current, Utc::now()).await.is_some());
    }

    #[tokio::test]
    async fn logout_closes_and_clears() {
        let sessions = SessionRegistry::new();
        let token = sessions.open(None, None, Utc::now()).await;
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, format!("carelog_session={}", token).parse().unwrap());

        let resp = logout(&sessions, &headers).await.unwrap();
        assert!(resp.headers()["Set-Cookie"].to_str().unwrap().contains("Max-Age=0"));
        assert!(sessions.get(&token, Utc::now()).await.is_none());

        // again, with nothing to close
        let resp = logout(&sessions, &headers).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
