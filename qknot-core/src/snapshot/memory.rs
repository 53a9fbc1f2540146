use parking_lot::Mutex;
use qknot_model::PendingJobSnapshot;

use super::SnapshotStore;
use crate::error::SnapshotError;

/// Process-local slot. Survives controller recreation as long as the store
/// itself is shared.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<PendingJobSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: PendingJobSnapshot) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
        }
    }

    pub fn current(&self) -> Option<PendingJobSnapshot> {
        self.slot.lock().clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<PendingJobSnapshot>, SnapshotError> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, snapshot: &PendingJobSnapshot) -> Result<(), SnapshotError> {
        *self.slot.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SnapshotError> {
        self.slot.lock().take();
        Ok(())
    }
}
