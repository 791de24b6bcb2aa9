#[tokio::main]
async fn main() -> geminibot::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("geminibot=info,serenity=warn"),
    )
    .init();
    log::info!("Starting Gemini Discord bot");

    match geminibot::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {e}");
            Err(e)
        }
    }
}
