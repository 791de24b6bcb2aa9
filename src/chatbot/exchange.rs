//! Prompt-in, reply-out exchange with at most one round of tool calls.

use std::sync::Arc;

use log::{debug, info};

use crate::error::{BotError, Result};
use crate::gemini::GenerativeModel;
use crate::tools::ToolExecutor;
use crate::types::{Content, FunctionCall, GenerateContentResponse, Part};

use super::prompt::Prompt;

/// Runs a single exchange against the model, resolving any requested tool calls once.
#[derive(Clone)]
pub struct ChatExchange {
    model: Arc<dyn GenerativeModel>,
    tools: ToolExecutor,
}

/// How the first model turn should be handled.
enum FirstTurn {
    Reply(String),
    ToolCalls {
        calls: Vec<FunctionCall>,
        model_content: Content,
    },
}

impl ChatExchange {
    pub fn new(model: Arc<dyn GenerativeModel>, tools: ToolExecutor) -> Self {
        Self { model, tools }
    }

    pub async fn chat(&self, prompt: &Prompt) -> Result<String> {
        let mut history = vec![Content::user_text(prompt.as_str())];

        let response = self.model.generate_content(history.clone()).await?;
        log_usage("text prompt", &response);

        let (calls, model_content) = match classify(response.into_first_content()?)? {
            FirstTurn::Reply(text) => return Ok(text),
            FirstTurn::ToolCalls {
                calls,
                model_content,
            } => (calls, model_content),
        };

        debug!("Processing {} function calls", calls.len());
        let results = self.tools.execute_all(&calls).await?;
        info!("Function response count: {}", results.len());

        history.push(model_content);
        history.push(Content::function_responses(results));

        let response = self.model.generate_content(history).await?;
        log_usage("web content", &response);

        let content = response.into_first_content()?;
        match content.parts.into_iter().next().map(|content_part| content_part.part) {
            Some(Part::Text(text)) => Ok(text),
            Some(other) => Err(BotError::UnexpectedPartType(other.kind())),
            None => Err(BotError::EmptyResponse),
        }
    }
}

/// Every part is scanned for function calls; without any, the first part must be text.
fn classify(content: Content) -> Result<FirstTurn> {
    let calls: Vec<FunctionCall> = content.function_calls().cloned().collect();
    if !calls.is_empty() {
        return Ok(FirstTurn::ToolCalls {
            calls,
            model_content: content,
        });
    }

    match content.parts.into_iter().next().map(|content_part| content_part.part) {
        Some(Part::Text(text)) => Ok(FirstTurn::Reply(text)),
        Some(other) => Err(BotError::UnexpectedPartType(other.kind())),
        None => Err(BotError::EmptyResponse),
    }
}

fn log_usage(label: &str, response: &GenerateContentResponse) {
    if let Some(usage) = response.usage_metadata {
        info!(
            "{label}: request tokens={}, response tokens={}, total tokens={}",
            usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
        );
    }
}
