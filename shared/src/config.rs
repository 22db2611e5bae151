use crate::sessions::DEFAULT_SESSION_IDLE_TTL_MINUTES;
use chrono::{Duration, FixedOffset};
use reports_block::types::ReportSettings;
use std::env;

pub const DEFAULT_TABLE_NAME: &str = "carelog";
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://gps.spectrumvoice.com/api/caregiver";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    /// Process-local; data is lost with the instance
    Memory,
}

/// Everything read from the environment at cold start
#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub store_backend: StoreBackend,
    pub upstream_base_url: String,
    pub report: ReportSettings,
    pub cors_allowed_origin: String,
    /// Sessions idle longer than this are dropped
    pub session_idle_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store_backend = match get("SHIFT_STORE").as_deref() {
            None | Some("dynamodb") => StoreBackend::DynamoDb,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                tracing::warn!("Unknown SHIFT_STORE '{}', using dynamodb", other);
                StoreBackend::DynamoDb
            }
        };

        let defaults = ReportSettings::default();
        let offset_minutes: i32 = parse_or(get("REPORT_UTC_OFFSET_MINUTES"), 0, "REPORT_UTC_OFFSET_MINUTES");
        let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| {
            tracing::warn!("REPORT_UTC_OFFSET_MINUTES={} out of range, using UTC", offset_minutes);
            defaults.offset
        });
        let weeks: usize = parse_or(get("REPORT_WEEKS"), defaults.weeks, "REPORT_WEEKS").max(1);
        let idle_minutes: i64 = parse_or(
            get("SESSION_IDLE_MINUTES"),
            DEFAULT_SESSION_IDLE_TTL_MINUTES,
            "SESSION_IDLE_MINUTES",
        )
        .max(1);

        Self {
            table_name: get("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            store_backend,
            upstream_base_url: get("UPSTREAM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            report: ReportSettings { offset, weeks },
            cors_allowed_origin: get("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| "*".to_string()),
            session_idle_ttl: Duration::minutes(idle_minutes),
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T, key: &str) -> T {
    match raw {
        Some(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}='{}'", key, v);
            default
        }),
        None => default,
    }
}
