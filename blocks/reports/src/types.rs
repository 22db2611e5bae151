use carelog_atoms::shifts::Shift;
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Offset and history length used for every report computation
#[derive(Debug, Clone, Copy)]
pub struct ReportSettings {
    /// Local time of the care agency; days and weeks are cut here
    pub offset: FixedOffset,
    /// How many recent weeks the week picker offers
    pub weeks: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            weeks: 12,
        }
    }
}

// ========== WEEK ==========
/// Monday..=Sunday
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

// ========== FILTER ==========
/// Raw query parameters of the report endpoints
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub client_id: Option<String>,
    pub caregiver: Option<String>,
    /// Any day inside the wanted week, `YYYY-MM-DD`
    pub week: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportFilter {
    /// None means all clients
    pub client_id: Option<String>,
    /// None means all caregivers
    pub caregiver_name: Option<String>,
    pub week: WeekRange,
}

// ========== MATRIX ==========
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportColumn {
    pub shift_id: String,
    pub date: NaiveDate,
    /// e.g. "Mon, 01"
    pub day_label: String,
    /// e.g. "9:00 AM"
    pub start_label: String,
    pub client_name: String,
    pub caregiver_name: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub task_id: u32,
    pub label: String,
    /// One entry per column
    pub completed: Vec<bool>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteBlock {
    pub shift_id: String,
    pub heading: String,
    pub notes: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub title: String,
    pub week: WeekRange,
    pub shifts: Vec<Shift>,
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<TaskRow>,
    pub notes: Vec<NoteBlock>,
}

impl WeeklyReport {
    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }
}
