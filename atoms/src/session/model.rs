use crate::catalog::{Client, Task};
use crate::shifts::Shift;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveShift {
    pub client: Client,
    pub started_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
    pub notes: String,
}

/// idle -> active -> summary -> idle
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ShiftState {
    #[default]
    Idle,
    Active(ActiveShift),
    /// Holds the record that was persisted when the shift ended
    Summary(Shift),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartShiftPayload {
    pub client_id: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionNotesPayload {
    pub notes: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveView {
    pub client: Client,
    pub start_time: DateTime<Utc>,
    pub elapsed: String,
    pub tasks: Vec<Task>,
    pub notes: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub shift_id: String,
    pub client: Client,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: String,
    pub completed_tasks: Vec<Task>,
    pub incomplete_tasks: Vec<Task>,
    pub notes: String,
}

/// What the tracker looks like right now, with derived fields filled in
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ShiftView {
    Idle,
    Active(ActiveView),
    Summary(SummaryView),
}
