use crate::catalog::{find_client, task_from_id, Client, Task, TASK_CATALOG};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A finished caregiver visit. Only `notes` changes after creation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub client: Client,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub completed_tasks: Vec<Task>,
    pub incomplete_tasks: Vec<Task>,
    #[serde(default)]
    pub notes: String,
}

impl Shift {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn is_task_completed(&self, task_id: u32) -> bool {
        self.completed_tasks.iter().any(|t| t.id == task_id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateShiftPayload {
    pub client: Client,
    #[serde(default)]
    pub caregiver_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub completed_tasks: Vec<Task>,
    pub incomplete_tasks: Vec<Task>,
    #[serde(default)]
    pub notes: String,
}

impl CreateShiftPayload {
    /// The two task lists must split the catalog exactly: no overlap, no gaps, no strays.
    /// The client must be one we know and the window must not run backwards.
    pub fn validate(&self) -> Result<(), String> {
        if self.client.id.trim().is_empty() {
            return Err("Shift is missing a client".to_string());
        }
        if find_client(&self.client.id).is_none() {
            return Err(format!("Unknown client {}", self.client.id));
        }
        if self.end_time < self.start_time {
            return Err("Shift ends before it starts".to_string());
        }

        let mut seen = HashSet::new();
        for task in self.completed_tasks.iter().chain(self.incomplete_tasks.iter()) {
            if !seen.insert(task.id) {
                return Err(format!("Task {} appears more than once", task.id));
            }
        }

        let catalog: HashSet<u32> = TASK_CATALOG.iter().map(|(id, _)| *id).collect();
        if seen != catalog {
            let mut missing: Vec<u32> = catalog.difference(&seen).copied().collect();
            let mut unknown: Vec<u32> = seen.difference(&catalog).copied().collect();
            missing.sort_unstable();
            unknown.sort_unstable();
            return Err(format!(
                "Task lists do not match the checklist (missing: {:?}, unknown: {:?})",
                missing, unknown
            ));
        }

        Ok(())
    }

    /// Labels, flags and the client name come from the catalog, never the caller,
    /// so a record reads back the same from every store.
    pub fn into_shift(self, id: String) -> Shift {
        let rebuild = |tasks: Vec<Task>, completed: bool| -> Vec<Task> {
            let mut ids: Vec<u32> = tasks.iter().map(|t| t.id).collect();
            ids.sort_unstable();
            ids.into_iter().map(|id| task_from_id(id, completed)).collect()
        };

        Shift {
            id,
            client: find_client(&self.client.id).unwrap_or(self.client),
            caregiver_name: self.caregiver_name,
            start_time: self.start_time,
            end_time: self.end_time,
            completed_tasks: rebuild(self.completed_tasks, true),
            incomplete_tasks: rebuild(self.incomplete_tasks, false),
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotesPayload {
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteAllResponse {
    pub deleted: usize,
}
