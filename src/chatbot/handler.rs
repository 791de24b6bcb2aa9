//! Main handler for bot mentions.

use log::{debug, error, info};
use poise::serenity_prelude::{Context, Message as SerenityMessage, UserId};

use crate::bot::Data;
use crate::error::Result;
use crate::mention::extract_prompt;

use super::prompt::Prompt;
use super::response::send_response;

/// Main handler for messages that mention the bot.
pub async fn handle_bot_mention(
    ctx: &Context,
    new_message: &SerenityMessage,
    data: &Data,
    bot_user_id: UserId,
) -> Result<()> {
    if new_message.author.id == bot_user_id {
        return Ok(());
    }

    let mentioned: Vec<UserId> = new_message.mentions.iter().map(|user| user.id).collect();
    let Some(user_text) = extract_prompt(&new_message.content, &mentioned, bot_user_id) else {
        return Ok(());
    };

    info!(
        "Received message from {} in channel {}, prompt: {}",
        new_message.author.tag(),
        new_message.channel_id,
        user_text
    );

    if let Err(e) = new_message.channel_id.broadcast_typing(&ctx.http).await {
        debug!("Failed to broadcast typing indicator: {e}");
    }

    let reply = match data.exchange().chat(&Prompt::new(&user_text)).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(
                "Failed to call Gemini for {}: {}",
                new_message.author.tag(),
                e
            );
            e.user_message()
        }
    };

    send_response(ctx, new_message, &reply).await
}
