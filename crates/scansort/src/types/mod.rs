//! Core types for job tracking and classification

pub mod job;

pub use job::{Bucket, JobRecord, JobStatus};
