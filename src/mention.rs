//! Mention detection and cleanup for incoming Discord messages.

use std::sync::LazyLock;

use poise::serenity_prelude::UserId;
use regex::Regex;

static MENTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<@[0-9]+>").unwrap_or_else(|e| panic!("invalid mention pattern: {e}"))
});

/// Returns the prompt text for a message addressed to the bot.
///
/// `None` means the bot was not mentioned and the message should be ignored.
pub fn extract_prompt(content: &str, mentioned: &[UserId], bot_user_id: UserId) -> Option<String> {
    if !mentioned.contains(&bot_user_id) {
        return None;
    }
    Some(strip_mentions(content))
}

/// Removes every `<@digits>` mention from the text.
pub fn strip_mentions(content: &str) -> String {
    MENTION_PATTERN.replace_all(content, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot() -> UserId {
        UserId::new(1_234_567_890)
    }

    fn other() -> UserId {
        UserId::new(42)
    }

    #[test]
    fn skips_when_bot_not_mentioned() {
        assert_eq!(extract_prompt("hello <@42>", &[other()], bot()), None);
        assert_eq!(extract_prompt("hello", &[], bot()), None);
    }

    #[test]
    fn skips_when_markup_present_but_bot_not_in_mentions() {
        assert_eq!(extract_prompt("<@1234567890> hi", &[other()], bot()), None);
    }

    #[test]
    fn strips_bot_mention() {
        let prompt = extract_prompt("<@1234567890> what is rust?", &[bot()], bot());
        assert_eq!(prompt.as_deref(), Some(" what is rust?"));
    }

    #[test]
    fn strips_every_mention_and_keeps_order() {
        let text = "a<@1>b <@1234567890>c<@42>d";
        let cleaned = strip_mentions(text);
        assert_eq!(cleaned, "ab cd");
        assert!(!MENTION_PATTERN.is_match(&cleaned));
    }

    #[test]
    fn leaves_non_matching_markup_intact() {
        assert_eq!(strip_mentions("<@!12> <@> <#99> <@abc>"), "<@!12> <@> <#99> <@abc>");
    }

    #[test]
    fn preserves_unicode_text() {
        assert_eq!(strip_mentions("<@1>こんにちは、<@2>世界"), "こんにちは、世界");
    }
}
