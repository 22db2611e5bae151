use carelog_atoms::session::ShiftSession;
use chrono::{DateTime, Duration, Utc};
use lambda_http::http::{header::COOKIE, HeaderMap};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "carelog_session";

/// A logged-in caregiver and their shift tracker
#[derive(Debug)]
pub struct CaregiverSession {
    pub token: String,
    pub caregiver_name: Option<String>,
    pub company_name: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub shift: ShiftSession,
}

pub type SessionHandle = Arc<Mutex<CaregiverSession>>;

/// Idle time after which a session is dropped
pub const DEFAULT_SESSION_IDLE_TTL_MINUTES: i64 = 12 * 60;

#[derive(Debug)]
struct SessionEntry {
    handle: SessionHandle,
    last_seen: DateTime<Utc>,
}

/// Sessions live in memory for the lifetime of the Lambda instance.
/// Each one is locked independently so two caregivers never wait on each other.
/// A session untouched for `idle_ttl` counts as gone and is pruned on the next login.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    idle_ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_ttl(Duration::minutes(DEFAULT_SESSION_IDLE_TTL_MINUTES))
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    fn expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.last_seen > self.idle_ttl
    }

    /// Returns the new session token
    pub async fn open(
        &self,
        caregiver_name: Option<String>,
        company_name: Option<String>,
        now: DateTime<Utc>,
    ) -> String {
        let token = Uuid::new_v4().to_string();
        let session = CaregiverSession {
            token: token.clone(),
            caregiver_name,
            company_name,
            opened_at: now,
            shift: ShiftSession::new(),
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.expired(entry, now));
        if sessions.len() < before {
            tracing::info!(pruned = before - sessions.len(), "Expired sessions dropped");
        }

        sessions.insert(
            token.clone(),
            SessionEntry {
                handle: Arc::new(Mutex::new(session)),
                last_seen: now,
            },
        );
        tracing::info!(sessions = sessions.len(), "Session opened");
        token
    }

    /// Live session for `token`; a hit counts as activity
    pub async fn get(&self, token: &str, now: DateTime<Utc>) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let expired = self.expired(sessions.get(token)?, now);
        if expired {
            sessions.remove(token);
            tracing::warn!("Session expired after {} idle minutes", self.idle_ttl.num_minutes());
            return None;
        }

        let entry = sessions.get_mut(token)?;
        entry.last_seen = now;
        Some(Arc::clone(&entry.handle))
    }

    /// Look up the session named by the request's cookie header
    pub async fn from_headers(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<SessionHandle> {
        let token = session_token(headers)?;
        self.get(&token, now).await
    }

    pub async fn close(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/",
        SESSION_COOKIE, token
    )
}

pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    )
}

/// Pull our token out of a `Cookie: a=1; carelog_session=...` header value
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}

/// Checks every Cookie header; API Gateway v2 may split them
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(token_from_cookie_header)
        .map(|t| t.to_string())
}
