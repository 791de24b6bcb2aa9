//! Wire types for the Gemini `generateContent` API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BotError, Result};

/// Role of a conversation turn.
///
/// Maps to Gemini content roles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Turn authored by the human user, including function results
    User,
    /// Turn produced by the model
    #[default]
    Model,
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// The result of a function call, sent back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Map<String, Value>,
}

/// What a conversation part carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
    /// Any part kind the bot does not handle (inline data, code execution, ...)
    Unsupported,
}

impl Part {
    /// Short name of the part kind, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Part::Text(_) => "text",
            Part::FunctionCall(_) => "function call",
            Part::FunctionResponse(_) => "function response",
            Part::Unsupported => "unsupported",
        }
    }
}

/// One piece of a conversation turn as it appears on the wire.
///
/// Fields the bot does not interpret (`thoughtSignature`, `inlineData`, ...) are kept in
/// `extra` so a model turn can be sent back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WirePart", into = "WirePart")]
pub struct ContentPart {
    pub part: Part,
    pub extra: Map<String, Value>,
}

impl From<Part> for ContentPart {
    fn from(part: Part) -> Self {
        Self {
            part,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<WirePart> for ContentPart {
    fn from(wire: WirePart) -> Self {
        let part = if let Some(call) = wire.function_call {
            Part::FunctionCall(call)
        } else if let Some(response) = wire.function_response {
            Part::FunctionResponse(response)
        } else if let Some(text) = wire.text {
            Part::Text(text)
        } else {
            Part::Unsupported
        };
        Self {
            part,
            extra: wire.extra,
        }
    }
}

impl From<ContentPart> for WirePart {
    fn from(content_part: ContentPart) -> Self {
        let mut wire = WirePart {
            extra: content_part.extra,
            ..Default::default()
        };
        match content_part.part {
            Part::Text(text) => wire.text = Some(text),
            Part::FunctionCall(call) => wire.function_call = Some(call),
            Part::FunctionResponse(response) => wire.function_response = Some(response),
            Part::Unsupported => {}
        }
        wire
    }
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into()).into()],
        }
    }

    pub fn function_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: Role::User,
            parts: responses
                .into_iter()
                .map(|response| Part::FunctionResponse(response).into())
                .collect(),
        }
    }

    /// Every function call in this turn, in order.
    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.parts.iter().filter_map(|content_part| match &content_part.part {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

/// Token accounting returned with every response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    /// Content of the first candidate, provided it carries at least one part.
    pub fn into_first_content(self) -> Result<Content> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .filter(|content| !content.parts.is_empty())
            .ok_or(BotError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_text_and_function_call_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "let me look"},
                        {"functionCall": {"name": "fetchWebsiteContent", "args": {"url": "https://a.test"}}},
                        {"inlineData": {"mimeType": "image/png", "data": ""}}
                    ]
                }
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 3, "totalTokenCount": 13}
        }))
        .expect("valid response");

        assert_eq!(
            response.usage_metadata.map(|u| u.total_token_count),
            Some(13)
        );
        let content = response.into_first_content().expect("content");
        assert_eq!(content.parts[0].part, Part::Text("let me look".to_string()));
        assert_eq!(content.parts[2].part, Part::Unsupported);
        let calls: Vec<_> = content.function_calls().collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "fetchWebsiteContent");
        assert_eq!(calls[0].args["url"], "https://a.test");
    }

    #[test]
    fn model_turn_is_echoed_unchanged() {
        let turn = json!({
            "role": "model",
            "parts": [
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0"}},
                {
                    "functionCall": {"name": "fetchWebsiteContent", "args": {"url": "https://a.test"}},
                    "thoughtSignature": "sig123"
                },
                {"text": "thinking", "thought": true}
            ]
        });
        let content: Content = serde_json::from_value(turn.clone()).expect("valid content");

        assert_eq!(content.parts[0].part, Part::Unsupported);
        assert_eq!(content.parts[1].part.kind(), "function call");
        assert_eq!(content.parts[1].extra["thoughtSignature"], "sig123");
        assert_eq!(
            serde_json::to_value(&content).expect("serializable"),
            turn
        );
    }

    #[test]
    fn serializes_function_response_in_wire_format() {
        let mut response = Map::new();
        response.insert("content".to_string(), json!("PAGE"));
        let content = Content::function_responses(vec![FunctionResponse {
            name: "fetchWebsiteContent".to_string(),
            response,
        }]);
        assert_eq!(
            serde_json::to_value(&content).expect("serializable"),
            json!({
                "role": "user",
                "parts": [{"functionResponse": {"name": "fetchWebsiteContent", "response": {"content": "PAGE"}}}]
            })
        );
    }

    #[test]
    fn no_candidates_is_empty_response() {
        let response = GenerateContentResponse::default();
        assert!(matches!(
            response.into_first_content(),
            Err(BotError::EmptyResponse)
        ));
    }

    #[test]
    fn candidate_without_parts_is_empty_response() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model"}, "finishReason": "SAFETY"}]
        }))
        .expect("valid response");
        assert!(matches!(
            response.into_first_content(),
            Err(BotError::EmptyResponse)
        ));
    }
}
