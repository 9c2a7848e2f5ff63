//! Services
//!
//! Business logic on top of the workspace crates.

pub mod chat;
pub mod ingest;
