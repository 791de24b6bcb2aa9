pub mod bot;
pub mod chatbot;
pub mod config;
pub mod error;
pub mod gemini;
pub mod mention;
pub mod tools;
pub mod types;

pub use bot::run;
