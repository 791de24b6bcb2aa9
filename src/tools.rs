//! Function-calling tools the model may invoke.

mod definitions;
mod executor;
mod web_fetch;

pub use definitions::{FunctionDeclaration, Tool, ToolName, get_tool_definitions};
pub use executor::ToolExecutor;
pub use web_fetch::{ContentFetcher, WebFetcher};

#[cfg(test)]
pub use web_fetch::MockContentFetcher;
