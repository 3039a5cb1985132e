//! OCR-driven classification and filing for scanned account documents
//!
//! Uploaded scans are OCR'd, mined for an account-holder name and an
//! account number, then filed into one of three buckets (fully indexed,
//! partially indexed, failed) under a deterministic name. Every upload
//! is tracked as a job in a registry that snapshots itself to disk.

pub mod config;
pub mod error;
pub mod extraction;
pub mod ocr;
pub mod processing;
pub mod registry;
pub mod routing;
pub mod server;
pub mod storage;
pub mod types;

pub use config::{ProcessingMode, ScanConfig};
pub use error::{Error, Result};
pub use registry::JobRegistry;
pub use routing::DocumentRouter;
pub use types::{Bucket, JobRecord, JobStatus};
