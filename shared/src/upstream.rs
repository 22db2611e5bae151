use carelog_atoms::caregivers::OnCallCaregiver;
use lambda_http::http::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::json;

/// Raw answer from the caregiver service, before any normalization
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false)
    }
}

/// What the proxy hands back to the browser
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyReply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl ProxyReply {
    fn json(status: StatusCode, body: String) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    /// `{"message": ...}` envelope used for every proxy-side failure
    pub fn message(status: StatusCode, message: &str) -> Self {
        Self::json(status, json!({ "message": message }).to_string())
    }
}

/// Thin client for the login and on-call endpoints. No retries, no explicit timeout.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn read(resp: reqwest::Response) -> Result<UpstreamReply, reqwest::Error> {
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.text().await?;

        Ok(UpstreamReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            content_type,
            body,
        })
    }

    pub async fn on_call(&self, customer_id: &str, pin: &str) -> Result<UpstreamReply, reqwest::Error> {
        let resp = self
            .http
            .get(format!("{}/on-call", self.base_url))
            .query(&[("CustomerID", customer_id), ("Pin", pin)])
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn login(&self, email: &str, pin: &serde_json::Value) -> Result<UpstreamReply, reqwest::Error> {
        let resp = self
            .http
            .post(format!("{}/login", self.base_url))
            .json(&json!({ "email": email, "pin": pin }))
            .send()
            .await?;
        Self::read(resp).await
    }
}

/// On-call contract:
/// - upstream error: same status, `{message, details}`
/// - JSON: passed through; a body that claims JSON but doesn't parse is a 500
/// - empty body: `[]`
/// - anything else: 502 with the raw body as details
pub fn normalize_on_call(reply: &UpstreamReply) -> ProxyReply {
    if !reply.is_success() {
        let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
        return ProxyReply::json(
            status,
            json!({
                "message": format!("Error from external API: {}", reply.status_text),
                "details": reply.body,
            })
            .to_string(),
        );
    }

    if reply.body.trim().is_empty() {
        return ProxyReply::json(StatusCode::OK, "[]".to_string());
    }

    if reply.is_json() {
        let value: serde_json::Value = match serde_json::from_str(&reply.body) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("Caregivers API sent malformed JSON: {}", e);
                return ProxyReply::message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("Failed to read caregivers API response: {}", e),
                );
            }
        };
        match serde_json::from_value::<Vec<OnCallCaregiver>>(value) {
            Ok(roster) => tracing::info!(caregivers = roster.len(), "on-call roster fetched"),
            Err(e) => tracing::warn!("On-call roster has an unexpected shape: {}", e),
        }
        return ProxyReply::json(StatusCode::OK, reply.body.clone());
    }

    tracing::warn!("Received non-JSON response from caregivers API: {}", reply.body);
    ProxyReply::json(
        StatusCode::BAD_GATEWAY,
        json!({
            "message": "Unexpected non-JSON response from caregivers API",
            "details": reply.body,
        })
        .to_string(),
    )
}

/// The roster in a successful JSON reply; None for anything else
pub fn parse_roster(reply: &UpstreamReply) -> Option<Vec<OnCallCaregiver>> {
    if !reply.is_success() || !reply.is_json() {
        return None;
    }
    match serde_json::from_str(&reply.body) {
        Ok(roster) => Some(roster),
        Err(e) => {
            tracing::warn!("Could not read on-call roster: {}", e);
            None
        }
    }
}

/// Login replies go back untouched: same status, same body, JSON stays JSON.
pub fn passthrough_login(reply: &UpstreamReply) -> ProxyReply {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    ProxyReply {
        status,
        content_type: if reply.is_json() {
            "application/json"
        } else {
            "text/plain; charset=utf-8"
        },
        body: reply.body.clone(),
    }
}

/// Caregiver identity carried in a successful login body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginIdentity {
    pub caregiver_name: Option<String>,
    pub company_name: Option<String>,
}

/// None unless the reply is a 2xx JSON document
pub fn login_identity(reply: &UpstreamReply) -> Option<LoginIdentity> {
    if !reply.is_success() || !reply.is_json() {
        return None;
    }
    let value: serde_json::Value = match serde_json::from_str(&reply.body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Login reply claimed JSON but did not parse: {}", e);
            return None;
        }
    };
    let field = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    Some(LoginIdentity {
        caregiver_name: field("MyName"),
        company_name: field("companyName"),
    })
}
