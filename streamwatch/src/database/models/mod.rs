//! Row models.
//!
//! These map directly onto the schema; timestamps are epoch milliseconds.

pub mod chat;
pub mod fetch_history;
pub mod video;

pub use chat::*;
pub use fetch_history::*;
pub use video::*;
