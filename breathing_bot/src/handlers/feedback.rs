use std::sync::Arc;

use bot_commons::{teloxide_retry, useful_methods::UserStuff};
use teloxide::{prelude::*, types::ParseMode};

use crate::{config::Config, error::HandlerResult, keyboards::cancel_keyboard, texts};

use super::{send_with_main_keyboard, BreathingDialogue};

/// The user was asked for feedback and sent something. Pass it on to the admin.
pub(super) async fn receive_feedback(
    bot: Bot,
    dialogue: BreathingDialogue,
    message: Message,
    config: Arc<Config>,
) -> HandlerResult {
    let text = message.text().unwrap_or_default();

    dialogue.exit().await?;

    let Some(admin_id) = config.admin_id else {
        send_with_main_keyboard(&bot, message.chat.id, texts::FEEDBACK_NO_ADMIN, &config).await?;
        return Ok(());
    };

    let sender = message
        .from
        .as_ref()
        .map_or_else(|| "?".to_string(), UserStuff::name_with_username);

    let result = teloxide_retry!(
        bot.send_message(admin_id, texts::feedback_for_admin(&sender, text))
            .parse_mode(ParseMode::Html)
            .await
    );

    let reply = match result {
        Ok(_) => {
            log::info!("Got feedback from {sender}");
            texts::FEEDBACK_SENT
        }
        Err(e) => {
            log::error!("Failed to deliver feedback from {sender}: {e}");
            texts::FEEDBACK_FAILED
        }
    };

    send_with_main_keyboard(&bot, message.chat.id, reply, &config).await?;
    Ok(())
}

/// Stickers and such can't be put into a text message. Keep waiting for
/// actual feedback.
pub(super) async fn reject_non_text(bot: Bot, message: Message) -> HandlerResult {
    bot.send_message(message.chat.id, texts::FEEDBACK_NOT_TEXT)
        .reply_markup(cancel_keyboard())
        .await?;
    Ok(())
}
