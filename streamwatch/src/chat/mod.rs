//! Chat ingestion: candidate selection, filtering and classification.

pub mod filter;
pub mod ingest;
pub mod priority;

pub use filter::{ChatFilter, filter_allowed, newer_than};
pub use ingest::{ChatIngester, IngestOutcome, TargetKind};
pub use priority::{FetchPrioritySelector, select_candidate};
