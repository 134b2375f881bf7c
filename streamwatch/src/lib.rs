//! streamwatch library crate.
//!
//! Tracks scheduled and live broadcasts of a set of channels and ingests
//! classified live chat into SQLite. Exposed as a library for the binary
//! and for integration testing.

pub mod api;
pub mod chat;
pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod logging;
pub mod reconcile;
pub mod services;
pub mod sync;
pub mod utils;
pub mod youtube;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
