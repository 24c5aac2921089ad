use std::sync::Arc;
use teloxide::{dispatching::dialogue::InMemStorage, dptree::deps, prelude::*};

use crate::{
    actions::reminder_spinloop, config::Config, database::Database,
    handlers::commands::Command, types::State,
};

/// # Panics
///
/// Panics if the configuration is broken or the database can't be opened.
pub async fn entry() {
    log::info!("ASYNC WOOOO");

    // A missing .env is fine, everything may come from the real environment.
    if let Err(e) = dotenv::dotenv() {
        log::debug!("Not loading .env: {e}");
    }

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => panic!("Bad configuration: {e}"),
    };
    log::debug!("Configuration: {config:?}");

    if config.admin_id.is_none() {
        log::warn!("ADMIN_ID is not set. News, stats and feedback will not work.");
    }

    let bot = Bot::new(&config.token);

    bot.set_my_commands(Command::generate_bot_commands())
        .await
        .expect("Failed to set bot commands!");

    let database = Arc::new(
        Database::new(&config.database_url)
            .await
            .expect("Failed to open the database!"),
    );

    tokio::spawn(reminder_spinloop(
        bot.clone(),
        Arc::downgrade(&database),
        config.webapp_url.clone(),
        config.broadcast_delay,
    ));

    log::info!("Dispatching the dispatcher!");

    Dispatcher::builder(bot, crate::handlers::schema())
        .default_handler(|_| async {})
        .dependencies(deps![InMemStorage::<State>::new(), database, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("it appears we have been bonked.");
}
