use teloxide::{
    prelude::*,
    types::{MessageId, ParseMode},
};

use crate::{
    actions::broadcast_copy,
    config::Config,
    database::Database,
    error::HandlerResult,
    keyboards::confirm_news_keyboard,
    texts,
    types::State,
};

use super::BreathingDialogue;

/// Where the conversation goes after trying to show the admin a preview
/// of the post. A post that can't be copied back to the admin won't reach
/// anyone else either, so they have to send another one.
fn after_preview(from_chat: ChatId, message_id: MessageId, copied: bool) -> State {
    if copied {
        State::AwaitingNewsConfirmation {
            from_chat,
            message_id,
        }
    } else {
        State::AwaitingNewsContent
    }
}

/// The admin sent the post to broadcast. Show it back to them as it will
/// look for everyone, and ask to confirm.
pub(super) async fn receive_news_content(
    bot: Bot,
    dialogue: BreathingDialogue,
    message: Message,
) -> HandlerResult {
    bot.send_message(message.chat.id, texts::NEWS_PREVIEW_HEADER)
        .parse_mode(ParseMode::Html)
        .await?;

    // Some messages can't be copied at all, e.g. polls in some cases or
    // service messages. Better to find out now than during the broadcast.
    let preview = bot
        .copy_message(message.chat.id, message.chat.id, message.id)
        .await;

    match &preview {
        Ok(_) => {
            bot.send_message(message.chat.id, texts::NEWS_CONFIRM_QUESTION)
                .reply_markup(confirm_news_keyboard())
                .await?;
        }
        Err(e) => {
            bot.send_message(message.chat.id, texts::news_preview_failed(e))
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }

    dialogue
        .update(after_preview(message.chat.id, message.id, preview.is_ok()))
        .await?;
    Ok(())
}

/// The admin pressed "send to everyone" on this preview.
pub(super) async fn confirm(
    bot: &Bot,
    dialogue: &BreathingDialogue,
    message: &Message,
    from_chat: ChatId,
    message_id: MessageId,
    database: &Database,
    config: &Config,
) -> HandlerResult {
    // Leave the state first, so that a second tap doesn't broadcast twice.
    dialogue.exit().await?;

    let recipients = database.get_all_users().await?;
    log::info!("Broadcasting news to {} users", recipients.len());

    bot.edit_message_text(
        message.chat.id,
        message.id,
        texts::broadcast_started(recipients.len()),
    )
    .await?;

    let report = broadcast_copy(
        bot,
        &recipients,
        from_chat,
        message_id,
        config.broadcast_delay,
    )
    .await;

    bot.edit_message_text(
        message.chat.id,
        message.id,
        texts::broadcast_finished(report.delivered, report.total),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

/// The admin changed their mind about the broadcast.
pub(super) async fn cancel(
    bot: &Bot,
    dialogue: &BreathingDialogue,
    message: &Message,
) -> HandlerResult {
    dialogue.exit().await?;
    bot.edit_message_text(message.chat.id, message.id, texts::NEWS_CANCELLED)
        .await?;
    Ok(())
}
