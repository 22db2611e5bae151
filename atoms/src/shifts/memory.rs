use super::model::Shift;
use super::service::{ShiftStore, StoreError};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local shift store for tests and offline runs
#[derive(Default)]
pub struct MemoryShiftStore {
    shifts: RwLock<Vec<Shift>>,
}

impl MemoryShiftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shifts(shifts: Vec<Shift>) -> Self {
        Self {
            shifts: RwLock::new(shifts),
        }
    }
}

#[async_trait]
impl ShiftStore for MemoryShiftStore {
    async fn list(&self) -> Result<Vec<Shift>, StoreError> {
        Ok(self.shifts.read().await.clone())
    }

    async fn create(&self, shift: Shift) -> Result<(), StoreError> {
        let mut shifts = self.shifts.write().await;
        if shifts.iter().any(|s| s.id == shift.id) {
            return Err(StoreError::Backend(format!("Shift {} already exists", shift.id)));
        }
        shifts.push(shift);
        Ok(())
    }

    async fn update_notes(&self, shift_id: &str, notes: &str) -> Result<(), StoreError> {
        let mut shifts = self.shifts.write().await;
        let shift = shifts
            .iter_mut()
            .find(|s| s.id == shift_id)
            .ok_or_else(|| StoreError::NotFound(shift_id.to_string()))?;
        shift.notes = notes.to_string();
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.shifts.read().await.iter().map(|s| s.id.clone()).collect())
    }

    async fn delete_batch(&self, shift_ids: &[String]) -> Result<(), StoreError> {
        self.shifts
            .write()
            .await
            .retain(|s| !shift_ids.contains(&s.id));
        Ok(())
    }
}
