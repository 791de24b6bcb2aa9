//! Prompt construction for the first model turn.

/// Appended to every user prompt so replies fit a single Discord message as plain text.
pub const LIMIT_CONDITION_SUFFIX: &str =
    "返答は合計2000文字以内にしてください。また出力形式はプレーンテキストにしてください。";

/// A cleaned user message with the formatting instruction appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(user_text: &str) -> Self {
        Prompt(format!("{user_text}{LIMIT_CONDITION_SUFFIX}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The original user text.
    ///
    /// Only exact when the user text does not itself end with the suffix.
    pub fn user_text(&self) -> &str {
        self.0
            .strip_suffix(LIMIT_CONDITION_SUFFIX)
            .unwrap_or(&self.0)
    }
}
