//! Reply delivery to Discord.

use log::{info, warn};
use poise::serenity_prelude::{Context, Message as SerenityMessage};

use crate::error::Result;

/// Discord rejects messages longer than this many characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Cut the reply down to Discord's message limit on a character boundary.
pub fn fit_to_discord(reply: &str) -> &str {
    match reply.char_indices().nth(DISCORD_MESSAGE_LIMIT) {
        Some((end, _)) => &reply[..end],
        None => reply,
    }
}

/// Send the chatbot reply to the channel the message came from.
pub async fn send_response(ctx: &Context, new_message: &SerenityMessage, reply: &str) -> Result<()> {
    if reply.trim().is_empty() {
        warn!("No response content generated");
        return Ok(());
    }

    let text = fit_to_discord(reply);
    if text.len() < reply.len() {
        warn!(
            "Reply truncated from {} to {DISCORD_MESSAGE_LIMIT} characters",
            reply.chars().count()
        );
    }

    new_message.channel_id.say(&ctx.http, text).await?;
    info!(
        "Replied to {} in channel {}: {}",
        new_message.author.tag(),
        new_message.channel_id,
        text
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_replies_are_untouched() {
        assert_eq!(fit_to_discord("hello"), "hello");
    }

    #[test]
    fn long_replies_are_cut_at_the_limit() {
        let reply = "a".repeat(2500);
        assert_eq!(fit_to_discord(&reply).len(), DISCORD_MESSAGE_LIMIT);
    }

    #[test]
    fn cuts_on_character_boundaries() {
        let reply = "あ".repeat(2001);
        let fitted = fit_to_discord(&reply);
        assert_eq!(fitted.chars().count(), DISCORD_MESSAGE_LIMIT);
        assert!(fitted.chars().all(|c| c == 'あ'));
    }

    #[test]
    fn exact_limit_is_kept() {
        let reply = "b".repeat(DISCORD_MESSAGE_LIMIT);
        assert_eq!(fit_to_discord(&reply), reply);
    }
}
