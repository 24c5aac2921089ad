use teloxide::types::User;

/// A bot command found at the start of a message, like `/start` or
/// `/news@Some_Bot hello there`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandText<'a> {
    /// Lowercase name of the command, without the `/` and the `@username` part.
    pub name: String,
    /// Everything after the command, with leading whitespace trimmed.
    pub params: &'a str,
}

/// Parse a command out of the message text.
///
/// Returns [`None`] if the text is not a command, or if it is a command
/// explicitly addressed to some other bot via `/command@OtherBot`.
#[must_use]
pub fn parse_command<'a>(text: &'a str, bot_username: &str) -> Option<CommandText<'a>> {
    if !text.starts_with('/') {
        return None;
    }

    let command = text.split_whitespace().next()?;

    // Telegram commands must be ASCII.
    // See https://core.telegram.org/bots/api#botcommand
    if !command.is_ascii() {
        return None;
    }

    let params = text[command.len()..].trim_start();
    let command = &command[1..];

    let name = if let Some(username_start) = command.find('@') {
        // Bot names are guaranteed ASCII, so ignore ASCII case specifically.
        if !command[username_start + 1..].eq_ignore_ascii_case(bot_username) {
            return None;
        }
        &command[..username_start]
    } else {
        command
    };

    if name.is_empty() {
        return None;
    }

    Some(CommandText {
        name: name.to_ascii_lowercase(),
        params,
    })
}

/// Returns `true` if the text is a command explicitly addressed to some
/// bot other than this one, like `/start@OtherBot`.
///
/// Such messages were meant for someone else in the chat and should be
/// left alone entirely.
#[must_use]
pub fn is_addressed_to_other_bot(text: &str, bot_username: &str) -> bool {
    let Some(command) = text
        .split_whitespace()
        .next()
        .and_then(|x| x.strip_prefix('/'))
    else {
        return false;
    };

    matches!(
        command.split_once('@'),
        Some((_, username)) if !username.eq_ignore_ascii_case(bot_username)
    )
}

/// Formats a person as `Full Name (@username)`, or just `Full Name`
/// if they have no username.
#[must_use]
pub fn name_with_username(full_name: &str, username: Option<&str>) -> String {
    match username {
        Some(username) => format!("{full_name} (@{username})"),
        None => full_name.to_string(),
    }
}

pub trait UserStuff {
    /// See [`name_with_username`].
    fn name_with_username(&self) -> String;
}

impl UserStuff for User {
    fn name_with_username(&self) -> String {
        name_with_username(&self.full_name(), self.username.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_commands() {
        let command = parse_command("/start", "Breathing_Bot").unwrap();
        assert_eq!(command.name, "start");
        assert_eq!(command.params, "");

        let command = parse_command("/News   hello there", "Breathing_Bot").unwrap();
        assert_eq!(command.name, "news");
        assert_eq!(command.params, "hello there");
    }

    #[test]
    fn addressed_commands() {
        let command = parse_command("/stats@breathing_bot", "Breathing_Bot").unwrap();
        assert_eq!(command.name, "stats");

        assert_eq!(parse_command("/stats@Other_Bot", "Breathing_Bot"), None);
    }

    #[test]
    fn not_commands() {
        assert_eq!(parse_command("hello /start", "Breathing_Bot"), None);
        assert_eq!(parse_command("/", "Breathing_Bot"), None);
        assert_eq!(parse_command("/привет", "Breathing_Bot"), None);
        assert_eq!(parse_command("/@Breathing_Bot", "Breathing_Bot"), None);
    }

    #[test]
    fn commands_for_other_bots() {
        assert!(is_addressed_to_other_bot("/start@OtherBot", "Breathing_Bot"));
        assert!(is_addressed_to_other_bot("/stats@Other_Bot hi", "Breathing_Bot"));
        assert!(!is_addressed_to_other_bot("/start@breathing_bot", "Breathing_Bot"));
        assert!(!is_addressed_to_other_bot("/start", "Breathing_Bot"));
        assert!(!is_addressed_to_other_bot("mail me at a@b.c", "Breathing_Bot"));
        assert!(!is_addressed_to_other_bot("hi /start@OtherBot", "Breathing_Bot"));
    }

    #[test]
    fn names() {
        assert_eq!(
            name_with_username("Anna Petrova", Some("anna")),
            "Anna Petrova (@anna)"
        );
        assert_eq!(name_with_username("Anna", None), "Anna");
    }
}
