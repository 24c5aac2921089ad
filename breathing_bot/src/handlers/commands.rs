use std::sync::Arc;

use bot_commons::useful_methods::parse_command;
use teloxide::{
    prelude::*,
    types::{BotCommand, ParseMode},
};

use crate::{
    config::Config, database::Database, error::HandlerResult, keyboards::cancel_keyboard, texts,
    types::State,
};

use super::{send_with_main_keyboard, BreathingDialogue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    News,
    Stats,
}

struct CommandInfo {
    command: Command,
    callname: &'static str,
    description: &'static str,
    /// Admin-only commands are not advertised to everyone.
    hidden: bool,
}

const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        command: Command::Start,
        callname: "start",
        description: "Главное меню",
        hidden: false,
    },
    CommandInfo {
        command: Command::News,
        callname: "news",
        description: "Разослать новость всем пользователям",
        hidden: true,
    },
    CommandInfo {
        command: Command::Stats,
        callname: "stats",
        description: "Статистика",
        hidden: true,
    },
];

impl Command {
    #[must_use]
    pub fn parse(text: &str, bot_username: &str) -> Option<Command> {
        let parsed = parse_command(text, bot_username)?;
        COMMANDS
            .iter()
            .find(|info| info.callname == parsed.name)
            .map(|info| info.command)
    }

    /// Commands to show in the Telegram client's command menu.
    #[must_use]
    pub fn generate_bot_commands() -> Vec<BotCommand> {
        COMMANDS
            .iter()
            .filter(|info| !info.hidden)
            .map(|info| BotCommand::new(info.callname, info.description))
            .collect()
    }
}

pub(super) async fn handle_command(
    bot: Bot,
    dialogue: BreathingDialogue,
    message: Message,
    command: Command,
    database: Arc<Database>,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(user) = message.from.as_ref() else {
        // Channel posts and such. Not for us.
        return Ok(());
    };

    match command {
        Command::Start => {
            database
                .add_user(user.id, user.username.as_deref(), &user.full_name())
                .await?;
            log::debug!("User {} pressed /start", user.id);

            dialogue.exit().await?;
            send_with_main_keyboard(
                &bot,
                message.chat.id,
                texts::greeting(&user.first_name),
                &config,
            )
            .await?;
        }
        Command::News => {
            if !config.is_admin(user.id) {
                return Ok(());
            }

            bot.send_message(message.chat.id, texts::NEWS_PROMPT)
                .parse_mode(ParseMode::Html)
                .reply_markup(cancel_keyboard())
                .await?;
            dialogue.update(State::AwaitingNewsContent).await?;
        }
        Command::Stats => {
            if !config.is_admin(user.id) {
                return Ok(());
            }

            let users = database.get_users_count().await?;
            let active_reminders = database.get_active_reminders_count().await?;
            bot.send_message(message.chat.id, texts::stats(users, active_reminders))
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing() {
        assert_eq!(Command::parse("/start", "Breathing_Bot"), Some(Command::Start));
        assert_eq!(
            Command::parse("/START@breathing_bot", "Breathing_Bot"),
            Some(Command::Start)
        );
        assert_eq!(Command::parse("/news", "Breathing_Bot"), Some(Command::News));
        assert_eq!(
            Command::parse("/stats please", "Breathing_Bot"),
            Some(Command::Stats)
        );
        assert_eq!(Command::parse("/help", "Breathing_Bot"), None);
        assert_eq!(Command::parse("/start@SomeoneElse_Bot", "Breathing_Bot"), None);
        assert_eq!(Command::parse("start", "Breathing_Bot"), None);
    }

    #[test]
    fn admin_commands_are_hidden() {
        let commands = Command::generate_bot_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command, "start");
    }
}
