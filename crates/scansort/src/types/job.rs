//! Job record types for tracking document lifecycle
//!
//! The serialized field names form the snapshot schema and must stay
//! compatible with previously written snapshot files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not yet queued or routed
    Pending,
    /// Waiting in the work queue (async mode only)
    Queued,
    /// Routing in progress
    Processing,
    /// Terminal: routed into a bucket
    Completed,
    /// Terminal: job-level failure (e.g. file vanished before routing)
    Error,
}

impl JobStatus {
    /// Whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// Destination bucket decided at completion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Both name and account number were extracted
    FullyIndexed,
    /// Exactly one identifying field was extracted
    PartiallyIndexed,
    /// Nothing extracted, or routing itself failed
    Failed,
}

impl Bucket {
    /// Directory-facing name for this bucket
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::FullyIndexed => "fully_indexed",
            Bucket::PartiallyIndexed => "partially_indexed",
            Bucket::Failed => "failed",
        }
    }
}

/// One tracked document, keyed by its originally submitted filename
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Filename as uploaded (registry key; resubmission overwrites)
    pub original_filename: String,
    /// Lifecycle status
    pub status: JobStatus,
    /// Destination bucket, set only at completion
    pub bucket: Option<Bucket>,
    /// Extracted account-holder name, if any
    pub extracted_name: Option<String>,
    /// Extracted account number, if any
    pub extracted_account: Option<String>,
    /// Final on-disk name after collision resolution
    pub stored_filename: String,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Routing start time
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal time
    pub completed_at: Option<DateTime<Utc>>,
    /// Job-level error message
    pub error: Option<String>,
}

impl JobRecord {
    /// Create a fresh pending record for a submitted filename
    pub fn new(original_filename: impl Into<String>) -> Self {
        let original_filename = original_filename.into();
        Self {
            stored_filename: original_filename.clone(),
            original_filename,
            status: JobStatus::Pending,
            bucket: None,
            extracted_name: None,
            extracted_account: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Mark as waiting in the work queue
    pub fn mark_queued(&mut self) {
        self.status = JobStatus::Queued;
    }

    /// Mark as routing, stamping the start time
    pub fn mark_processing(&mut self) {
        self.status = JobStatus::Processing;
        self.started_at = Some(Utc::now());
    }

    /// Mark as completed with the final routing outcome
    pub fn mark_completed(
        &mut self,
        bucket: Bucket,
        extracted_name: Option<String>,
        extracted_account: Option<String>,
        stored_filename: String,
    ) {
        self.status = JobStatus::Completed;
        self.bucket = Some(bucket);
        self.extracted_name = extracted_name;
        self.extracted_account = extracted_account;
        self.stored_filename = stored_filename;
        self.completed_at = Some(Utc::now());
    }

    /// Mark as a terminal job-level error
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.error = Some(message.into());
        self.completed_at = Some(Utc::now());
    }
}
