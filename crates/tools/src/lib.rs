//! Ragdesk Tools
//!
//! Tool execution for the chat orchestrator:
//! - `ToolDispatcher` - routes a tool call to a built-in or the external registry
//! - `Tool` / `BuiltinTools` - built-in tool interface and name-indexed table
//! - `ToolRegistry` - seam for externally provided tools
//! - `SearchProvider`, `ContentFetcher`, `WorkflowTrigger` - HTTP-backed providers
//!   with their own timeouts and degraded modes
//!
//! Providers take their credentials from `ToolsConfig`; nothing here reads
//! the process environment.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fetch;
pub mod impls;
pub mod registry;
pub mod search;
pub mod trait_def;
pub mod url_validation;
pub mod weather;
pub mod workflow;

#[cfg(test)]
mod test_helpers;

pub use config::ToolsConfig;
pub use dispatcher::ToolDispatcher;
pub use error::ToolError;
pub use fetch::{ContentFetcher, HttpContentFetcher};
pub use registry::{EmptyToolRegistry, ToolRegistry};
pub use search::{SearchProvider, SerpApiSearch};
pub use trait_def::{BuiltinTools, Tool};
pub use weather::{RandomSource, ThreadRngSource};
pub use workflow::{WebhookWorkflowTrigger, WorkflowOutcome, WorkflowTrigger};
