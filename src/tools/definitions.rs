//! Tool declarations for Gemini function calling.

use serde::Serialize;
use serde_json::{Value, json};
use strum::{EnumString, IntoStaticStr};

/// Tools the bot knows how to run, keyed by their function name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum ToolName {
    #[strum(serialize = "fetchWebsiteContent")]
    FetchWebsiteContent,
}

impl ToolName {
    /// Function name as declared to the model.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Returns the tool declarations sent with every Gemini request.
pub fn get_tool_definitions() -> Vec<Tool> {
    vec![Tool {
        function_declarations: vec![FunctionDeclaration {
            name: ToolName::FetchWebsiteContent.as_str().to_string(),
            description: "プロンプト中で指定されたURLにあるページの内容を取得する関数".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "ページの内容を取得したいURL"
                    }
                },
                "required": ["url"]
            }),
        }],
    }]
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn tool_names_parse_exactly() {
        assert_eq!(
            ToolName::from_str("fetchWebsiteContent").ok(),
            Some(ToolName::FetchWebsiteContent)
        );
        assert!(ToolName::from_str("fetchwebsitecontent").is_err());
        assert!(ToolName::from_str("doStuff").is_err());
    }

    #[test]
    fn declares_single_fetch_tool() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 1);
        let declaration = &tools[0].function_declarations[0];
        assert_eq!(declaration.name, "fetchWebsiteContent");
        assert_eq!(declaration.parameters["properties"]["url"]["type"], "string");
        assert_eq!(
            declaration.description,
            "プロンプト中で指定されたURLにあるページの内容を取得する関数"
        );
        assert_eq!(
            declaration.parameters["properties"]["url"]["description"],
            "ページの内容を取得したいURL"
        );
    }
}
