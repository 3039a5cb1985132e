//! Asynchronous processing: the upload queue and its worker

pub mod queue;
pub mod worker;

pub use queue::WorkQueue;
pub use worker::Worker;
