//! Repository layer for database access.

pub mod chat;
pub mod fetch_history;
pub mod video;

pub use chat::*;
pub use fetch_history::*;
pub use video::*;

/// Upper bound on bound parameters per `IN (...)` query.
pub(crate) const IN_CLAUSE_CHUNK: usize = 500;
