use super::clock::{format_duration, format_elapsed};
use super::model::{ActiveShift, ActiveView, ShiftState, ShiftView, SummaryView};
use crate::catalog::{catalog_tasks, find_client, Task};
use crate::shifts::{create_shift, CreateShiftPayload, Shift, ShiftStore, StoreError};
use chrono::{DateTime, Utc};

/// One caregiver's shift in progress. All transitions outside the
/// documented path are silent no-ops that report `false`.
#[derive(Debug, Default)]
pub struct ShiftSession {
    state: ShiftState,
}

impl ShiftSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ShiftState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ShiftState::Active(_))
    }

    /// Idle -> Active with a fresh checklist. Unknown clients leave the tracker untouched.
    pub fn start_shift(&mut self, client_id: &str, started_at: DateTime<Utc>) -> bool {
        if !matches!(self.state, ShiftState::Idle) {
            return false;
        }
        let Some(client) = find_client(client_id) else {
            tracing::debug!("Ignoring start for unknown client {}", client_id);
            return false;
        };

        self.state = ShiftState::Active(ActiveShift {
            client,
            started_at,
            tasks: catalog_tasks(),
            notes: String::new(),
        });
        true
    }

    pub fn toggle_task(&mut self, task_id: u32) -> bool {
        let ShiftState::Active(active) = &mut self.state else {
            return false;
        };
        match active.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                task.completed = !task.completed;
                true
            }
            None => false,
        }
    }

    pub fn set_notes(&mut self, notes: &str) -> bool {
        let ShiftState::Active(active) = &mut self.state else {
            return false;
        };
        active.notes = notes.to_string();
        true
    }

    /// The record ending the shift at `ended_at` would produce
    pub fn pending_record(
        &self,
        ended_at: DateTime<Utc>,
        caregiver_name: Option<String>,
    ) -> Option<CreateShiftPayload> {
        let ShiftState::Active(active) = &self.state else {
            return None;
        };
        let (completed_tasks, incomplete_tasks): (Vec<Task>, Vec<Task>) =
            active.tasks.iter().cloned().partition(|t| t.completed);

        Some(CreateShiftPayload {
            client: active.client.clone(),
            caregiver_name,
            start_time: active.started_at,
            end_time: ended_at,
            completed_tasks,
            incomplete_tasks,
            notes: active.notes.clone(),
        })
    }

    /// Active -> Summary. The record is persisted first; if the store
    /// refuses it the shift stays active so it can be ended again.
    pub async fn end_shift(
        &mut self,
        store: &dyn ShiftStore,
        ended_at: DateTime<Utc>,
        caregiver_name: Option<String>,
    ) -> Result<Option<&Shift>, StoreError> {
        let Some(record) = self.pending_record(ended_at, caregiver_name) else {
            return Ok(None);
        };

        let shift = create_shift(store, record).await?;
        self.state = ShiftState::Summary(shift);

        match &self.state {
            ShiftState::Summary(shift) => Ok(Some(shift)),
            _ => Ok(None),
        }
    }

    /// Summary -> Idle
    pub fn start_new_shift(&mut self) -> bool {
        if !matches!(self.state, ShiftState::Summary(_)) {
            return false;
        }
        self.state = ShiftState::Idle;
        true
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<String> {
        match &self.state {
            ShiftState::Active(active) => Some(format_elapsed(now - active.started_at)),
            _ => None,
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> ShiftView {
        match &self.state {
            ShiftState::Idle => ShiftView::Idle,
            ShiftState::Active(active) => ShiftView::Active(ActiveView {
                client: active.client.clone(),
                start_time: active.started_at,
                elapsed: format_elapsed(now - active.started_at),
                tasks: active.tasks.clone(),
                notes: active.notes.clone(),
            }),
            ShiftState::Summary(shift) => ShiftView::Summary(SummaryView {
                shift_id: shift.id.clone(),
                client: shift.client.clone(),
                start_time: shift.start_time,
                end_time: shift.end_time,
                duration: format_duration(shift.duration()),
                completed_tasks: shift.completed_tasks.clone(),
                incomplete_tasks: shift.incomplete_tasks.clone(),
                notes: if shift.notes.is_empty() {
                    "No notes were added.".to_string()
                } else {
                    shift.notes.clone()
                },
            }),
        }
    }
}
