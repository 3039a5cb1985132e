//! Classify-and-store routing for scanned documents
//!
//! The router turns one saved upload into a terminal job outcome: OCR,
//! field extraction, bucket decision, collision-safe filing. Every
//! failure mode along the way is absorbed into the failed bucket, so a
//! job that starts routing always reaches a terminal record instead of
//! a dangling `processing` state.

pub mod convert;

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::extraction::{parse_fields, ExtractedFields};
use crate::ocr::TextExtractor;
use crate::registry::JobRegistry;
use crate::types::{Bucket, JobRecord};

/// Characters stripped from computed filenames (illegal on common
/// filesystems)
const ILLEGAL_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Outcome of one routing pass
#[derive(Debug, Clone)]
struct RoutingOutcome {
    bucket: Bucket,
    stored_name: String,
    error: Option<String>,
}

/// Routes documents into buckets and keeps the registry in sync
pub struct DocumentRouter {
    registry: Arc<JobRegistry>,
    extractor: Arc<dyn TextExtractor>,
    storage: StorageConfig,
    /// Serializes collision checks with the moves that claim the
    /// checked names; independent of the registry lock
    fs_lock: Mutex<()>,
}

impl DocumentRouter {
    pub fn new(
        registry: Arc<JobRegistry>,
        extractor: Arc<dyn TextExtractor>,
        storage: StorageConfig,
    ) -> Self {
        Self {
            registry,
            extractor,
            storage,
            fs_lock: Mutex::new(()),
        }
    }

    /// Route one file to its bucket and record the terminal outcome.
    /// Returns the updated job record, or `None` when the filename is
    /// no longer tracked (resubmission raced the routing pass).
    pub fn route(&self, src_path: &Path, original: &str) -> Option<JobRecord> {
        self.registry.update(original, |r| r.mark_processing());

        let text = match self.extractor.extract_text(src_path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Text extraction failed for {:?}: {}", src_path, e);
                String::new()
            }
        };
        let fields = parse_fields(&text);

        let outcome = self.store_file(src_path, &fields);
        if let Some(ref cause) = outcome.error {
            tracing::warn!(
                "Routing '{}' fell back to failed bucket: {}",
                original,
                cause
            );
        }
        tracing::info!(
            "Routed '{}' -> {} as '{}'",
            original,
            outcome.bucket.as_str(),
            outcome.stored_name
        );

        self.registry.update(original, |r| {
            r.mark_completed(
                outcome.bucket,
                fields.name.clone(),
                fields.account.clone(),
                outcome.stored_name.clone(),
            );
        });
        self.registry.get(original)
    }

    /// Decide the bucket and place the file, holding the filesystem
    /// lock across the collision check and the move that claims the
    /// name.
    fn store_file(&self, src: &Path, fields: &ExtractedFields) -> RoutingOutcome {
        let src_name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = src
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        let is_image = matches!(ext.as_str(), "png" | "jpg" | "jpeg");

        let (bucket, stored_name) = match (&fields.name, &fields.account) {
            (None, None) => (Bucket::Failed, src_name.clone()),
            (name, account) => {
                let bucket = if fields.is_complete() {
                    Bucket::FullyIndexed
                } else {
                    Bucket::PartiallyIndexed
                };
                let base = match (name, account) {
                    (Some(n), Some(a)) => {
                        format!("{}_{}", sanitize_filename(n), sanitize_filename(a))
                    }
                    (Some(key), None) | (None, Some(key)) => sanitize_filename(key),
                    (None, None) => unreachable!(),
                };
                let stored_ext = if is_image {
                    ".pdf".to_string()
                } else if ext.is_empty() {
                    String::new()
                } else {
                    format!(".{}", ext)
                };
                (bucket, format!("{}{}", base, stored_ext))
            }
        };

        let dest_dir = self.dir_for(bucket);

        let _guard = self.fs_lock.lock();

        let dest_path = match prepare_destination(dest_dir, &stored_name) {
            Ok(path) => path,
            Err(e) => return self.fail_in_place(src, &src_name, &e.to_string()),
        };

        let placed = if bucket != Bucket::Failed && is_image {
            // Image sources are re-encoded as single-page PDFs before
            // filing; the source is removed only after a clean write.
            match convert::image_to_pdf(src, &dest_path) {
                Ok(()) => {
                    if let Err(e) = std::fs::remove_file(src) {
                        tracing::warn!("Failed to remove converted source {:?}: {}", src, e);
                    }
                    Ok(())
                }
                Err(e) => {
                    return self.fail_in_place(src, &src_name, &e.to_string());
                }
            }
        } else {
            move_file(src, &dest_path)
        };

        match placed {
            Ok(()) => RoutingOutcome {
                bucket,
                stored_name: file_name_of(&dest_path),
                error: None,
            },
            Err(e) => self.fail_in_place(src, &src_name, &e.to_string()),
        }
    }

    /// Last-resort placement: move the untouched source into the failed
    /// bucket under its original name. Called with the filesystem lock
    /// already held.
    fn fail_in_place(&self, src: &Path, src_name: &str, cause: &str) -> RoutingOutcome {
        let fallback = match prepare_destination(&self.storage.failed_dir, src_name) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Failed bucket unavailable for {:?}: {}", src, e);
                return RoutingOutcome {
                    bucket: Bucket::Failed,
                    stored_name: src_name.to_string(),
                    error: Some(cause.to_string()),
                };
            }
        };

        match move_file(src, &fallback) {
            Ok(()) => RoutingOutcome {
                bucket: Bucket::Failed,
                stored_name: file_name_of(&fallback),
                error: Some(cause.to_string()),
            },
            Err(e) => {
                // The file stays wherever it was; the job still
                // completes with the failed bucket recorded.
                tracing::error!("Move to failed bucket failed for {:?}: {}", src, e);
                RoutingOutcome {
                    bucket: Bucket::Failed,
                    stored_name: src_name.to_string(),
                    error: Some(format!("{}; fallback move failed: {}", cause, e)),
                }
            }
        }
    }

    fn dir_for(&self, bucket: Bucket) -> &PathBuf {
        match bucket {
            Bucket::FullyIndexed => &self.storage.fully_indexed_dir,
            Bucket::PartiallyIndexed => &self.storage.partially_indexed_dir,
            Bucket::Failed => &self.storage.failed_dir,
        }
    }
}

/// Strip characters illegal in filenames on common filesystems
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c))
        .collect()
}

/// Create the destination directory lazily and resolve name collisions
/// by appending `_1`, `_2`, … before the extension. Must be called with
/// the filesystem lock held so the returned path stays unclaimed until
/// the move.
fn prepare_destination(dir: &Path, stored_name: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut dest = dir.join(stored_name);
    if !dest.exists() {
        return Ok(dest);
    }

    let name_path = Path::new(stored_name);
    let stem = name_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| stored_name.to_string());
    let ext = name_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        dest = dir.join(format!("{}_{}{}", stem, counter, ext));
        if !dest.exists() {
            return Ok(dest);
        }
        counter += 1;
    }
}

/// Rename, falling back to copy-and-delete across filesystems
fn move_file(src: &Path, dest: &Path) -> std::io::Result<()> {
    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(src, dest)?;
            std::fs::remove_file(src)
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::types::JobStatus;

    struct FixedText(&'static str);

    impl TextExtractor for FixedText {
        fn extract_text(&self, _path: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn extract_text(&self, path: &Path) -> Result<String> {
            Err(Error::extraction(path.display().to_string(), "engine down"))
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        storage: StorageConfig,
        registry: Arc<JobRegistry>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let base = dir.path();
            let storage = StorageConfig {
                scan_dir: base.join("scan"),
                fully_indexed_dir: base.join("full"),
                partially_indexed_dir: base.join("partial"),
                failed_dir: base.join("failed"),
            };
            storage.ensure_dirs().unwrap();
            let registry = Arc::new(JobRegistry::restore_from_disk(base.join("snapshot.json")));
            Self {
                _dir: dir,
                storage,
                registry,
            }
        }

        fn router(&self, extractor: impl TextExtractor + 'static) -> DocumentRouter {
            DocumentRouter::new(
                self.registry.clone(),
                Arc::new(extractor),
                self.storage.clone(),
            )
        }

        fn submit(&self, name: &str, content: &[u8]) -> PathBuf {
            let path = self.storage.scan_dir.join(name);
            std::fs::write(&path, content).unwrap();
            self.registry.create(name);
            path
        }
    }

    #[test]
    fn test_fully_indexed_pdf() {
        let h = Harness::new();
        let router = h.router(FixedText("Surname: Doe\nAccount no: 9988776655"));
        let src = h.submit("form.pdf", b"%PDF-1.4 dummy");

        let record = router.route(&src, "form.pdf").unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.bucket, Some(Bucket::FullyIndexed));
        assert_eq!(record.stored_filename, "Doe_9988776655.pdf");
        assert!(h.storage.fully_indexed_dir.join("Doe_9988776655.pdf").exists());
        assert!(!src.exists());
    }

    #[test]
    fn test_partially_indexed_keeps_source_extension() {
        let h = Harness::new();
        let router = h.router(FixedText("Account Number: 1234567890"));
        let src = h.submit("scan.pdf", b"%PDF-1.4 dummy");

        let record = router.route(&src, "scan.pdf").unwrap();
        assert_eq!(record.bucket, Some(Bucket::PartiallyIndexed));
        assert_eq!(record.stored_filename, "1234567890.pdf");
        assert_eq!(record.extracted_account.as_deref(), Some("1234567890"));
        assert_eq!(record.extracted_name, None);
    }

    #[test]
    fn test_blank_text_goes_to_failed_unrenamed() {
        let h = Harness::new();
        let router = h.router(FixedText(""));
        let src = h.submit("unreadable.pdf", b"%PDF-1.4 dummy");

        let record = router.route(&src, "unreadable.pdf").unwrap();
        assert_eq!(record.bucket, Some(Bucket::Failed));
        assert_eq!(record.stored_filename, "unreadable.pdf");
        assert!(h.storage.failed_dir.join("unreadable.pdf").exists());
        assert!(record.extracted_name.is_none() && record.extracted_account.is_none());
    }

    #[test]
    fn test_collision_suffixes_are_distinct() {
        let h = Harness::new();
        let router = h.router(FixedText("Account Number: 1234567890"));

        let mut stored = Vec::new();
        for i in 0..3 {
            let name = format!("batch{}.pdf", i);
            let src = h.submit(&name, format!("content {}", i).as_bytes());
            let record = router.route(&src, &name).unwrap();
            stored.push(record.stored_filename);
        }

        assert_eq!(stored[0], "1234567890.pdf");
        assert_eq!(stored[1], "1234567890_1.pdf");
        assert_eq!(stored[2], "1234567890_2.pdf");
        for (i, name) in stored.iter().enumerate() {
            let content = std::fs::read(h.storage.partially_indexed_dir.join(name)).unwrap();
            assert_eq!(content, format!("content {}", i).as_bytes());
        }
    }

    #[test]
    fn test_image_source_converted_to_pdf() {
        let h = Harness::new();
        let router = h.router(FixedText("Account Number: 1234567890"));

        // A real PNG so conversion succeeds
        let src = h.storage.scan_dir.join("photo.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([200, 200, 200]))
            .save(&src)
            .unwrap();
        h.registry.create("photo.png");

        let record = router.route(&src, "photo.png").unwrap();
        assert_eq!(record.bucket, Some(Bucket::PartiallyIndexed));
        assert_eq!(record.stored_filename, "1234567890.pdf");
        let pdf_path = h.storage.partially_indexed_dir.join("1234567890.pdf");
        let bytes = std::fs::read(pdf_path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(!src.exists());
    }

    #[test]
    fn test_conversion_failure_redirects_to_failed() {
        let h = Harness::new();
        let router = h.router(FixedText("Account Number: 1234567890"));
        // Claims to be a PNG but is not decodable
        let src = h.submit("broken.png", b"not an image at all");

        let record = router.route(&src, "broken.png").unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.bucket, Some(Bucket::Failed));
        assert_eq!(record.stored_filename, "broken.png");
        assert!(h.storage.failed_dir.join("broken.png").exists());
        // Fields were extracted; the conversion override still wins
        assert_eq!(record.extracted_account.as_deref(), Some("1234567890"));
    }

    #[test]
    fn test_extraction_failure_is_not_fatal() {
        let h = Harness::new();
        let router = h.router(FailingExtractor);
        let src = h.submit("down.pdf", b"%PDF-1.4 dummy");

        let record = router.route(&src, "down.pdf").unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.bucket, Some(Bucket::Failed));
        assert!(h.storage.failed_dir.join("down.pdf").exists());
    }

    #[test]
    fn test_missing_source_still_terminates() {
        let h = Harness::new();
        let router = h.router(FixedText(""));
        h.registry.create("gone.pdf");
        let src = h.storage.scan_dir.join("gone.pdf");

        // Source never written; move fails, job still completes
        let record = router.route(&src, "gone.pdf").unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.bucket, Some(Bucket::Failed));
    }

    #[test]
    fn test_sanitize_strips_illegal_characters() {
        assert_eq!(sanitize_filename("a/b\\c:d*e?f\"g<h>i|j"), "abcdefghij");
        assert_eq!(sanitize_filename("Jane Mensah"), "Jane Mensah");
    }
}
