//! One synchronization run: reconcile, refresh, select, ingest.

pub mod report;
pub mod service;

pub use report::SyncReport;
pub use service::{SyncOptions, SyncService, SyncSettings};
