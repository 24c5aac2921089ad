pub mod commands;
mod feedback;
mod news;
mod reminders;

use std::sync::Arc;

use bot_commons::useful_methods::is_addressed_to_other_bot;
use teloxide::{
    dispatching::{
        dialogue::{Dialogue, InMemStorage},
        HandlerExt, UpdateFilterExt, UpdateHandler,
    },
    prelude::*,
    types::{CallbackQuery, Me, MessageId, ParseMode},
};

use crate::{
    config::Config,
    database::Database,
    error::{BotError, HandlerResult},
    keyboards::{cancel_keyboard, main_keyboard},
    texts,
    types::{CallbackData, MenuButton, ReminderTime, State},
};

use self::commands::Command;

pub type BreathingDialogue = Dialogue<State, InMemStorage<State>>;

/// What an incoming message means, given where its chat is in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Command(Command),
    MenuButton(MenuButton),
    Feedback,
    /// Something that can't be passed on as feedback, like a sticker.
    FeedbackNotText,
    ReminderTime(ReminderTime),
    BadReminderTime,
    NewsContent,
}

/// Decide what to do with a message.
///
/// Commands and menu buttons come first, so they work no matter where the
/// user is in a conversation. Only then does the conversation state get a
/// say. Commands meant for other bots are never ours to handle.
fn route(text: Option<&str>, bot_username: &str, state: &State) -> Option<Route> {
    if let Some(text) = text {
        if is_addressed_to_other_bot(text, bot_username) {
            return None;
        }
        if let Some(command) = Command::parse(text, bot_username) {
            return Some(Route::Command(command));
        }
        if let Some(button) = MenuButton::from_text(text) {
            return Some(Route::MenuButton(button));
        }
    }

    match state {
        State::Idle | State::AwaitingNewsConfirmation { .. } => None,
        State::AwaitingFeedback => Some(match text {
            Some(_) => Route::Feedback,
            None => Route::FeedbackNotText,
        }),
        State::AwaitingReminderTime => Some(match text.map(str::parse::<ReminderTime>) {
            Some(Ok(time)) => Route::ReminderTime(time),
            _ => Route::BadReminderTime,
        }),
        State::AwaitingNewsContent => Some(Route::NewsContent),
    }
}

fn route_message(message: Message, me: Me, state: State) -> Option<Route> {
    route(message.text(), me.username(), &state)
}

/// What an inline button press should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonAction {
    SetTime(ReminderTime),
    AskCustomTime,
    TurnOff,
    Cancel,
    Broadcast {
        from_chat: ChatId,
        message_id: MessageId,
    },
    CancelBroadcast,
}

/// Decide what a button press does. [`None`] means nothing, e.g. for
/// stale buttons left over from a conversation that is already over.
fn button_action(data: CallbackData, state: &State, is_admin: bool) -> Option<ButtonAction> {
    Some(match (data, state) {
        (CallbackData::SetTime(time), _) => ButtonAction::SetTime(time),
        (CallbackData::SetTimeCustom, _) => ButtonAction::AskCustomTime,
        (CallbackData::SetTimeOff, _) => ButtonAction::TurnOff,
        (CallbackData::Cancel, State::Idle) => return None,
        (CallbackData::Cancel, _) => ButtonAction::Cancel,
        (
            CallbackData::NewsConfirm,
            &State::AwaitingNewsConfirmation {
                from_chat,
                message_id,
            },
        ) if is_admin => ButtonAction::Broadcast {
            from_chat,
            message_id,
        },
        (CallbackData::NewsCancel, State::AwaitingNewsConfirmation { .. }) => {
            ButtonAction::CancelBroadcast
        }
        (CallbackData::NewsConfirm | CallbackData::NewsCancel, _) => return None,
    })
}

/// The whole update handling tree.
pub fn schema() -> UpdateHandler<BotError> {
    let messages = Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<State>, State>()
        .filter_map(route_message)
        .branch(dptree::case![Route::Command(command)].endpoint(commands::handle_command))
        .branch(dptree::case![Route::MenuButton(button)].endpoint(handle_menu_button))
        .branch(dptree::case![Route::Feedback].endpoint(feedback::receive_feedback))
        .branch(dptree::case![Route::FeedbackNotText].endpoint(feedback::reject_non_text))
        .branch(
            dptree::case![Route::ReminderTime(time)].endpoint(reminders::receive_custom_time),
        )
        .branch(dptree::case![Route::BadReminderTime].endpoint(reminders::reject_bad_time))
        .branch(dptree::case![Route::NewsContent].endpoint(news::receive_news_content));

    // Every button press gets answered so it stops spinning, even ones this
    // bot can't make sense of.
    let callbacks = Update::filter_callback_query()
        .inspect_async(answer_callback_query)
        .enter_dialogue::<CallbackQuery, InMemStorage<State>, State>()
        .endpoint(handle_callback_query);

    dptree::entry().branch(messages).branch(callbacks)
}

async fn handle_menu_button(
    bot: Bot,
    dialogue: BreathingDialogue,
    message: Message,
    button: MenuButton,
    database: Arc<Database>,
) -> HandlerResult {
    match button {
        MenuButton::Feedback => {
            bot.send_message(message.chat.id, texts::FEEDBACK_PROMPT)
                .reply_markup(cancel_keyboard())
                .await?;
            dialogue.update(State::AwaitingFeedback).await?;
        }
        MenuButton::Reminders => {
            dialogue.exit().await?;
            reminders::show_reminders_menu(&bot, &message, &database).await?;
        }
    }
    Ok(())
}

async fn answer_callback_query(bot: Bot, query: CallbackQuery) {
    if let Err(e) = bot.answer_callback_query(query.id).await {
        log::debug!("Failed answering callback query: {e}");
    }
}

async fn handle_callback_query(
    bot: Bot,
    dialogue: BreathingDialogue,
    query: CallbackQuery,
    state: State,
    database: Arc<Database>,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(data) = query.data.as_deref().and_then(CallbackData::parse) else {
        log::debug!("Ignoring unknown callback data {:?}", query.data);
        return Ok(());
    };

    // Only buttons on actual messages are of interest. Those are all ours.
    let Some(message) = query.regular_message() else {
        return Ok(());
    };

    let Some(action) = button_action(data, &state, config.is_admin(query.from.id)) else {
        return Ok(());
    };

    match action {
        ButtonAction::SetTime(time) => {
            reminders::set_preset_time(&bot, &dialogue, &query.from, message, time, &database)
                .await
        }
        ButtonAction::AskCustomTime => reminders::ask_custom_time(&bot, &dialogue, message).await,
        ButtonAction::TurnOff => {
            reminders::turn_off(&bot, &dialogue, &query.from, message, &database).await
        }
        ButtonAction::Cancel => cancel(&bot, &dialogue, message, &config).await,
        ButtonAction::Broadcast {
            from_chat,
            message_id,
        } => {
            news::confirm(
                &bot, &dialogue, message, from_chat, message_id, &database, &config,
            )
            .await
        }
        ButtonAction::CancelBroadcast => news::cancel(&bot, &dialogue, message).await,
    }
}

/// Drop whatever the user was doing and get them back to the main menu.
async fn cancel(
    bot: &Bot,
    dialogue: &BreathingDialogue,
    message: &Message,
    config: &Config,
) -> HandlerResult {
    dialogue.exit().await?;

    // No biggie if this fails, e.g. if the message is too old to delete.
    let _ = bot.delete_message(message.chat.id, message.id).await;

    bot.send_message(message.chat.id, texts::CANCELLED)
        .reply_markup(main_keyboard(&config.webapp_url))
        .await?;
    Ok(())
}

/// Send an HTML message with the main keyboard attached.
async fn send_with_main_keyboard(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    config: &Config,
) -> Result<Message, teloxide::RequestError> {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(main_keyboard(&config.webapp_url))
        .await
}
