use anyhow::Result;
use log::info;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;

use promobot::bot;
use promobot::config::Config;
use promobot::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    info!("Starting Promo Telegram Bot");

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    let bot = Bot::new(config.telegram_token.clone());
    let state = Arc::new(AppState::new(config));

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let state = Arc::clone(&state);
            move |bot: Bot, msg: Message| {
                let state = Arc::clone(&state);
                async move { bot::message_handler(bot, msg, state).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let state = Arc::clone(&state);
            move |bot: Bot, q: CallbackQuery| {
                let state = Arc::clone(&state);
                async move { bot::callback_handler(bot, q, state).await }
            }
        }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
