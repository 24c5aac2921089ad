use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{ParseMode, User},
    RequestError,
};

use crate::{
    config::Config,
    database::Database,
    error::HandlerResult,
    keyboards::{cancel_keyboard, reminders_keyboard},
    texts,
    types::{ReminderTime, State},
};

use super::{send_with_main_keyboard, BreathingDialogue};

/// Send the reminder time picker, mentioning the current time if one is on.
pub(super) async fn show_reminders_menu(
    bot: &Bot,
    message: &Message,
    database: &Database,
) -> HandlerResult {
    let current = match &message.from {
        Some(user) => database
            .get_reminder(user.id)
            .await?
            .and_then(|(time, is_active)| is_active.then_some(time)),
        None => None,
    };

    bot.send_message(message.chat.id, texts::reminders_menu(current))
        .parse_mode(ParseMode::Html)
        .reply_markup(reminders_keyboard())
        .await?;
    Ok(())
}

pub(super) async fn set_preset_time(
    bot: &Bot,
    dialogue: &BreathingDialogue,
    user: &User,
    message: &Message,
    time: ReminderTime,
    database: &Database,
) -> HandlerResult {
    dialogue.exit().await?;
    database.set_reminder(user.id, time).await?;
    log::debug!("User {} set a reminder at {time}", user.id);

    edit_menu(bot, message, texts::reminder_set(time)).await?;
    Ok(())
}

pub(super) async fn ask_custom_time(
    bot: &Bot,
    dialogue: &BreathingDialogue,
    message: &Message,
) -> HandlerResult {
    bot.edit_message_text(message.chat.id, message.id, texts::REMINDER_TIME_PROMPT)
        .parse_mode(ParseMode::Html)
        .reply_markup(cancel_keyboard())
        .await?;
    dialogue.update(State::AwaitingReminderTime).await?;
    Ok(())
}

pub(super) async fn turn_off(
    bot: &Bot,
    dialogue: &BreathingDialogue,
    user: &User,
    message: &Message,
    database: &Database,
) -> HandlerResult {
    dialogue.exit().await?;
    database.disable_reminder(user.id).await?;
    log::debug!("User {} turned reminders off", user.id);

    edit_menu(bot, message, texts::REMINDERS_OFF).await?;
    Ok(())
}

/// Replace the time picker with a plain message.
async fn edit_menu(
    bot: &Bot,
    message: &Message,
    text: impl Into<String>,
) -> Result<(), RequestError> {
    bot.edit_message_text(message.chat.id, message.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// The user was asked to type a time and did.
pub(super) async fn receive_custom_time(
    bot: Bot,
    dialogue: BreathingDialogue,
    message: Message,
    time: ReminderTime,
    database: Arc<Database>,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(user) = message.from.as_ref() else {
        return Ok(());
    };

    database.set_reminder(user.id, time).await?;
    log::debug!("User {} set a custom reminder at {time}", user.id);

    send_with_main_keyboard(&bot, message.chat.id, texts::reminder_set(time), &config).await?;
    dialogue.exit().await?;
    Ok(())
}

/// The user was asked to type a time and sent something else. Ask again.
pub(super) async fn reject_bad_time(bot: Bot, message: Message) -> HandlerResult {
    bot.send_message(message.chat.id, texts::REMINDER_TIME_INVALID)
        .reply_markup(cancel_keyboard())
        .await?;
    Ok(())
}
