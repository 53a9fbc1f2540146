use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use qknot_model::PendingJobSnapshot;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::SnapshotStore;
use crate::error::SnapshotError;

/// JSON file holding at most one [`PendingJobSnapshot`].
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the slot, so the file on disk is always a complete record.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn discard_corrupt(&self, reason: &str) {
        warn!(
            path = %self.path.display(),
            reason,
            "discarding unreadable pending job snapshot"
        );
        if let Err(err) = self.clear() {
            warn!(
                path = %self.path.display(),
                error = %err,
                "failed to remove unreadable pending job snapshot"
            );
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<PendingJobSnapshot>, SnapshotError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<PendingJobSnapshot>(&bytes) {
            Ok(snapshot) if snapshot.is_resumable() => {
                debug!(job_id = %snapshot.job_id, "loaded pending job snapshot");
                Ok(Some(snapshot))
            }
            Ok(_) => {
                self.discard_corrupt("snapshot has an empty job id");
                Ok(None)
            }
            Err(err) => {
                self.discard_corrupt(&err.to_string());
                Ok(None)
            }
        }
    }

    fn save(&self, snapshot: &PendingJobSnapshot) -> Result<(), SnapshotError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        debug!(
            job_id = %snapshot.job_id,
            path = %self.path.display(),
            "saved pending job snapshot"
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), SnapshotError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
