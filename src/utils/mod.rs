//! Utilities
//!
//! Common utilities used throughout the application.

pub mod broadcast;
pub mod error;
pub mod paths;

pub use error::*;
pub use paths::*;
