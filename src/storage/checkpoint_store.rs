//! JSON checkpoint file with atomic replace
//!
//! Every save writes a complete snapshot to a sibling temporary file, syncs
//! it, and renames it over the checkpoint. A process killed mid-save leaves
//! either the previous checkpoint or the new one, never a torn file.

use crate::state::{Checkpoint, CheckpointRecord};
use crate::storage::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Durable home of the [`Checkpoint`]
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next snapshot is staged in
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Loads the checkpoint, falling back to an empty one
    ///
    /// A missing file is a fresh start. An unreadable or unparsable file is
    /// logged and also treated as a fresh start; this never fails.
    pub fn load(&self) -> Checkpoint {
        match self.try_load() {
            Ok(Some(checkpoint)) => {
                info!(
                    "Loaded checkpoint: {} processed, {} blocked domains, cursor at {}",
                    checkpoint.processed_count(),
                    checkpoint.blocked_count(),
                    checkpoint.current_index()
                );
                checkpoint
            }
            Ok(None) => {
                debug!("No checkpoint at {}, starting fresh", self.path.display());
                Checkpoint::new()
            }
            Err(e) => {
                error!("Failed to load checkpoint {}: {}", self.path.display(), e);
                Checkpoint::new()
            }
        }
    }

    /// Loads the checkpoint, reporting errors to the caller
    pub fn try_load(&self) -> StorageResult<Option<Checkpoint>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let record: CheckpointRecord = serde_json::from_str(&content)?;
        Ok(Some(Checkpoint::from(record)))
    }

    /// Saves a snapshot, logging instead of failing
    ///
    /// Returns true if the snapshot reached disk.
    pub fn save(&self, checkpoint: &Checkpoint) -> bool {
        match self.try_save(checkpoint) {
            Ok(()) => {
                debug!("Progress saved to {}", self.path.display());
                true
            }
            Err(e) => {
                error!("Failed to save checkpoint {}: {}", self.path.display(), e);
                false
            }
        }
    }

    /// Writes a snapshot via temp file + rename
    pub fn try_save(&self, checkpoint: &Checkpoint) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let encoded = serde_json::to_vec_pretty(&checkpoint.to_record())?;
        let tmp_path = self.temp_path();

        let mut file = File::create(&tmp_path).map_err(|e| StorageError::io(&tmp_path, e))?;
        file.write_all(&encoded)
            .and_then(|_| file.sync_all())
            .map_err(|e| StorageError::io(&tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::io(&self.path, e))?;
        Ok(())
    }

    /// Removes the checkpoint so the next run starts from the beginning
    pub fn clear(&self) -> StorageResult<()> {
        for path in [self.path.clone(), self.temp_path()] {
            match fs::remove_file(&path) {
                Ok(()) => info!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove {}: {}", path.display(), e);
                    return Err(StorageError::io(path, e));
                }
            }
        }
        Ok(())
    }
}
