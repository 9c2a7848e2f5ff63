//! Storage Layer
//!
//! Handles all data persistence: session transcripts and JSON config.

pub mod config;
pub mod json_file;
pub mod memory;
pub mod session_store;

pub use config::*;
pub use json_file::*;
pub use memory::*;
pub use session_store::*;
