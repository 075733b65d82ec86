//! Tool dispatch — from a model's tool call to a spatial answer.

pub mod dispatcher;
pub mod repair;
pub mod schema;
pub mod types;

pub use dispatcher::ToolDispatcher;
pub use schema::{definition, list_tools, ToolDefinition};
pub use types::{Answer, Intent, Operation, Repair, ToolCall, ToolResponse};
