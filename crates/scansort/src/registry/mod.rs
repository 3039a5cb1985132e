//! Job registry with periodic snapshot persistence
//!
//! The registry is the single source of truth for job lifecycle. All
//! operations take one mutex over the whole map; snapshot writes copy
//! the map under the lock and perform file IO outside it, so readers
//! and writers never block on disk.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::types::JobRecord;

/// Durable mapping from original filename to job record
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, JobRecord>>,
    snapshot_path: PathBuf,
}

impl JobRegistry {
    /// Create a registry, restoring the last snapshot if one exists.
    /// A missing or unreadable snapshot is non-fatal: the registry
    /// starts empty and the condition is logged as a warning.
    pub fn restore_from_disk(snapshot_path: impl Into<PathBuf>) -> Self {
        let snapshot_path = snapshot_path.into();
        let jobs = match Self::load_snapshot(&snapshot_path) {
            Ok(Some(jobs)) => {
                tracing::info!("Restored {} jobs from snapshot", jobs.len());
                jobs
            }
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::warn!("Failed to load snapshot {:?}: {}", snapshot_path, e);
                HashMap::new()
            }
        };

        Self {
            jobs: Mutex::new(jobs),
            snapshot_path,
        }
    }

    fn load_snapshot(path: &Path) -> std::io::Result<Option<HashMap<String, JobRecord>>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let jobs = serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Some(jobs))
    }

    /// Insert a fresh pending record, discarding any prior record for
    /// the same filename (resubmission: last write wins).
    pub fn create(&self, original_filename: &str) {
        let record = JobRecord::new(original_filename);
        self.jobs
            .lock()
            .insert(original_filename.to_string(), record);
    }

    /// Apply a mutation to the record if present; unknown filenames are
    /// a silent no-op.
    pub fn update<F>(&self, original_filename: &str, mutate: F)
    where
        F: FnOnce(&mut JobRecord),
    {
        if let Some(record) = self.jobs.lock().get_mut(original_filename) {
            mutate(record);
        }
    }

    /// Current record for a filename, if tracked
    pub fn get(&self, original_filename: &str) -> Option<JobRecord> {
        self.jobs.lock().get(original_filename).cloned()
    }

    /// Snapshot copy of every record
    pub fn list(&self) -> Vec<JobRecord> {
        self.jobs.lock().values().cloned().collect()
    }

    /// Number of tracked jobs
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Serialize the full map and atomically replace the snapshot file.
    /// Failures are logged, never propagated: persistence is best-effort
    /// durability, not a transactional guarantee.
    pub fn persist_now(&self) {
        let copy = self.jobs.lock().clone();
        if let Err(e) = self.write_snapshot(&copy) {
            tracing::warn!("Snapshot save failed: {}", e);
        }
    }

    fn write_snapshot(&self, jobs: &HashMap<String, JobRecord>) -> std::io::Result<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(jobs)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        // Write-temp-then-rename so readers never observe a partial file
        let tmp = self.snapshot_path.with_extension("tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.snapshot_path)?;
        Ok(())
    }

    /// Spawn the periodic persistence task. Runs for the process
    /// lifetime; snapshot failures never crash the process.
    pub fn spawn_snapshot_task(registry: Arc<Self>, interval_secs: u64) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            // First tick fires immediately; skip it
            interval.tick().await;
            loop {
                interval.tick().await;
                registry.persist_now();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bucket, JobStatus};

    fn temp_snapshot() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs_snapshot.json");
        (dir, path)
    }

    #[test]
    fn test_create_and_get() {
        let (_dir, path) = temp_snapshot();
        let registry = JobRegistry::restore_from_disk(path);

        registry.create("doc.pdf");
        let record = registry.get("doc.pdf").unwrap();
        assert_eq!(record.status, JobStatus::Pending);
        assert!(registry.get("other.pdf").is_none());
    }

    #[test]
    fn test_resubmission_discards_history() {
        let (_dir, path) = temp_snapshot();
        let registry = JobRegistry::restore_from_disk(path);

        registry.create("doc.pdf");
        registry.update("doc.pdf", |r| r.mark_processing());
        registry.create("doc.pdf");

        let record = registry.get("doc.pdf").unwrap();
        assert_eq!(record.status, JobStatus::Pending);
        assert!(record.started_at.is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let (_dir, path) = temp_snapshot();
        let registry = JobRegistry::restore_from_disk(path);
        registry.update("ghost.pdf", |r| r.mark_error("boom"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (_dir, path) = temp_snapshot();

        let registry = JobRegistry::restore_from_disk(&path);
        registry.create("a.pdf");
        registry.create("b.png");
        registry.update("a.pdf", |r| {
            r.mark_processing();
            r.mark_completed(
                Bucket::PartiallyIndexed,
                None,
                Some("1234567890".to_string()),
                "1234567890.pdf".to_string(),
            );
        });
        registry.persist_now();

        let restored = JobRegistry::restore_from_disk(&path);
        assert_eq!(restored.len(), 2);
        let a = restored.get("a.pdf").unwrap();
        assert_eq!(a.status, JobStatus::Completed);
        assert_eq!(a.bucket, Some(Bucket::PartiallyIndexed));
        assert_eq!(a.extracted_account.as_deref(), Some("1234567890"));
        assert_eq!(a.stored_filename, "1234567890.pdf");
        let b = restored.get("b.png").unwrap();
        assert_eq!(b.status, JobStatus::Pending);
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let (_dir, path) = temp_snapshot();
        std::fs::write(&path, "not json {").unwrap();
        let registry = JobRegistry::restore_from_disk(&path);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_snapshot_starts_empty() {
        let (_dir, path) = temp_snapshot();
        let registry = JobRegistry::restore_from_disk(path);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_no_leftover_tmp_file() {
        let (dir, path) = temp_snapshot();
        let registry = JobRegistry::restore_from_disk(&path);
        registry.create("a.pdf");
        registry.persist_now();
        assert!(path.exists());
        assert!(!dir.path().join("jobs_snapshot.tmp").exists());
    }
}
