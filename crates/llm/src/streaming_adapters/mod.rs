//! Provider-specific streaming adapters
//!
//! Each adapter turns a provider's raw stream lines into `StreamEvent`s.

pub mod openai;

pub use openai::OpenAiSseAdapter;
