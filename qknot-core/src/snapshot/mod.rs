//! Persistence for the single pending-job slot.

mod file;
mod memory;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use qknot_model::PendingJobSnapshot;

use crate::error::SnapshotError;

/// Repository over the one persisted pending-job record.
///
/// Implementations must make `save` atomic: a concurrent or crashed reader
/// observes either the previous record or the new one, never a mix.
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<Option<PendingJobSnapshot>, SnapshotError>;

    fn save(&self, snapshot: &PendingJobSnapshot) -> Result<(), SnapshotError>;

    /// Clearing an empty slot is not an error.
    fn clear(&self) -> Result<(), SnapshotError>;
}
