//! Discord bot core logic and event handling.

use std::error::Error as StdError;
use std::sync::Arc;

use log::{debug, error, info};
use poise::{
    Framework, FrameworkOptions,
    serenity_prelude::{ClientBuilder, Context, FullEvent, GatewayIntents},
};

use crate::chatbot::{ChatExchange, handle_bot_mention};
use crate::config::Config;
use crate::error::Result;
use crate::gemini::GeminiClient;
use crate::tools::{ToolExecutor, WebFetcher};

type EventResult = std::result::Result<(), Box<dyn StdError + Send + Sync>>;

/// Shared state available to every event handler.
pub struct Data {
    exchange: ChatExchange,
}

impl Data {
    pub fn exchange(&self) -> &ChatExchange {
        &self.exchange
    }
}

/// Run the Discord bot.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;

    debug!("Initializing Gemini client");
    let model = GeminiClient::new(&config.gemini)?;
    let fetcher = WebFetcher::new(&config.fetch)?;
    let exchange = ChatExchange::new(Arc::new(model), ToolExecutor::new(Arc::new(fetcher)));

    debug!("Setting up gateway intents");
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            event_handler: |ctx, event, _framework, data| Box::pin(event_handler(ctx, event, data)),
            ..Default::default()
        })
        .setup(move |_ctx, ready, _framework| {
            Box::pin(async move {
                info!("Bot is ready and connected to Discord as {}", ready.user.name);
                Ok(Data { exchange })
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    info!("Starting Discord client");

    tokio::select! {
        result = client.start() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, closing Discord connection");
            shard_manager.shutdown_all().await;
        }
    }

    Ok(())
}

async fn event_handler(ctx: &Context, event: &FullEvent, data: &Data) -> EventResult {
    if let FullEvent::Message { new_message } = event {
        let bot_user_id = ctx.cache.current_user().id;
        if let Err(e) = handle_bot_mention(ctx, new_message, data, bot_user_id).await {
            error!("Failed to handle message {}: {}", new_message.id, e);
        }
    }
    Ok(())
}
