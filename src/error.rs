use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Serenity error: {0}")]
    Serenity(Box<poise::serenity_prelude::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Gemini request failed: {0}")]
    ModelCall(#[source] reqwest::Error),

    #[error("Gemini API error ({status}): {message}")]
    ModelApi { status: StatusCode, message: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Invalid argument '{argument}' for tool '{tool}'")]
    ArgumentType {
        tool: &'static str,
        argument: &'static str,
    },

    #[error("Failed to fetch website content: {0}")]
    Fetch(String),

    #[error("Refusing to fetch URL: {0}")]
    BlockedUrl(String),

    #[error("Unknown tool requested: {0}")]
    UnknownTool(String),

    #[error("Unexpected {0} part in model response")]
    UnexpectedPartType(&'static str),

    #[error("{0} timed out")]
    Timeout(&'static str),
}

impl From<poise::serenity_prelude::Error> for BotError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        BotError::Serenity(Box::new(err))
    }
}

impl BotError {
    /// Returns a user-friendly error message suitable for displaying in Discord
    pub fn user_message(&self) -> String {
        match self {
            BotError::Serenity(_) => {
                "Sorry, I'm having trouble communicating with Discord right now. Please try again later.".to_string()
            }
            BotError::Config(_) | BotError::EnvVar(_) | BotError::Reqwest(_) => {
                "Sorry, there's a configuration issue on my end. Please contact the bot administrator.".to_string()
            }
            BotError::ModelApi { status, .. } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    "Sorry, I'm having authentication issues with my AI service. Please contact the bot administrator.".to_string()
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    "Sorry, I've hit my rate limit. Please try again in a few moments.".to_string()
                }
                status if status.is_server_error() => {
                    "Sorry, the AI service is experiencing issues right now. Please try again later.".to_string()
                }
                _ => {
                    "Sorry, there was an issue with my request to the AI service. Please try again or contact the bot administrator.".to_string()
                }
            },
            BotError::ModelCall(_) => {
                "Sorry, I'm having trouble connecting to my AI service. Please try again later.".to_string()
            }
            BotError::EmptyResponse | BotError::UnexpectedPartType(_) => {
                "Sorry, I received an unexpected response from my AI service. Please try again.".to_string()
            }
            BotError::ArgumentType { .. } | BotError::UnknownTool(_) => {
                "Sorry, I tried to use a tool I couldn't run. Please try rephrasing your request.".to_string()
            }
            BotError::Fetch(_) => {
                "Sorry, I couldn't read that web page. Please check the link and try again.".to_string()
            }
            BotError::BlockedUrl(_) => {
                "Sorry, I'm not allowed to open that address.".to_string()
            }
            BotError::Timeout(_) => {
                "Sorry, that took too long. Please try again in a moment.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
