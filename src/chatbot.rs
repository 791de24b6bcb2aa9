//! AI chatbot module - handles bot mentions and the Gemini exchange.

mod exchange;
mod handler;
mod prompt;
mod response;

pub use exchange::ChatExchange;
pub use handler::handle_bot_mention;
pub use prompt::Prompt;
