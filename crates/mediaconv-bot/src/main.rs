use anyhow::Context;
use mediaconv_bot::{telegram, BotService};
use mediaconv_core::telemetry::{init_tracing, LogFormat};
use mediaconv_core::Config;
use std::sync::Arc;
use teloxide::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env())?;

    let config = Config::from_env().context("Failed to load configuration")?;
    let Some(token) = config.bot_token.clone() else {
        tracing::error!("BOT_TOKEN is not set; the bot cannot connect to Telegram");
        anyhow::bail!("BOT_TOKEN must be set to start the bot");
    };

    tracing::info!(
        environment = %config.environment,
        production = config.is_production(),
        temp_dir = %config.temp_dir.display(),
        max_concurrent = config.max_concurrent_processes,
        max_queue = config.max_queue_size,
        timeout_secs = config.process_timeout.as_secs(),
        "Starting mediaconv bot"
    );

    let service = Arc::new(BotService::new(config)?);
    let bot = Bot::new(token);
    let me = bot
        .get_me()
        .await
        .context("Failed to reach Telegram, check BOT_TOKEN")?;
    tracing::info!(username = %me.username(), "Connected to Telegram");

    telegram::run(bot, service).await;

    tracing::info!("Bot stopped");
    Ok(())
}
