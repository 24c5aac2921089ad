use std::{fmt::Display, str::FromStr};

use chrono::{NaiveTime, Timelike};
use teloxide::types::{ChatId, MessageId};

/// Time of day a daily reminder fires at, with minute resolution.
///
/// Always displayed (and stored) as zero-padded `HH:MM`, which is what
/// the scheduler compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderTime(NaiveTime);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a time like 09:30, got {0:?}")]
pub struct ReminderTimeParseError(String);

impl ReminderTime {
    /// Returns [`None`] if the hour or minute is out of range.
    #[must_use]
    pub fn new(hour: u32, minute: u32) -> Option<ReminderTime> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(ReminderTime)
    }

    /// The minute the given moment falls into, seconds discarded.
    #[must_use]
    pub fn of(time: &impl Timelike) -> ReminderTime {
        ReminderTime::new(time.hour(), time.minute())
            .expect("Hour and minute of an existing time are always valid")
    }

    /// The minute after this one, wrapping around midnight.
    #[must_use]
    pub fn next_minute(self) -> ReminderTime {
        ReminderTime(self.0.overflowing_add_signed(chrono::TimeDelta::minutes(1)).0)
    }

    #[must_use]
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl FromStr for ReminderTime {
    type Err = ReminderTimeParseError;

    /// Accepts `H:MM` and `HH:MM`, with surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ReminderTimeParseError(s.to_string());

        let (hour, minute) = s.trim().split_once(':').ok_or_else(error)?;

        let all_digits = |x: &str| x.bytes().all(|b| b.is_ascii_digit());
        if !(1..=2).contains(&hour.len()) || minute.len() != 2 {
            return Err(error());
        }
        if !all_digits(hour) || !all_digits(minute) {
            return Err(error());
        }

        let hour = hour.parse().map_err(|_| error())?;
        let minute = minute.parse().map_err(|_| error())?;

        ReminderTime::new(hour, minute).ok_or_else(error)
    }
}

impl Display for ReminderTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Payload of the inline keyboard buttons this bot sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    /// One of the preset reminder times was picked.
    SetTime(ReminderTime),
    /// User wants to type their own reminder time.
    SetTimeCustom,
    /// User wants no more reminders.
    SetTimeOff,
    /// Cancel whatever the user was in the middle of.
    Cancel,
    NewsConfirm,
    NewsCancel,
}

impl CallbackData {
    const SET_TIME_PREFIX: &'static str = "set_time_";

    /// Returns [`None`] for payloads this bot doesn't know about, e.g.
    /// buttons from an older version of it.
    #[must_use]
    pub fn parse(data: &str) -> Option<CallbackData> {
        Some(match data {
            "cancel_action" => CallbackData::Cancel,
            "news_confirm" => CallbackData::NewsConfirm,
            "news_cancel" => CallbackData::NewsCancel,
            _ => match data.strip_prefix(Self::SET_TIME_PREFIX)? {
                "custom" => CallbackData::SetTimeCustom,
                "off" => CallbackData::SetTimeOff,
                time => CallbackData::SetTime(time.parse().ok()?),
            },
        })
    }
}

impl Display for CallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackData::SetTime(time) => write!(f, "{}{time}", Self::SET_TIME_PREFIX),
            CallbackData::SetTimeCustom => write!(f, "{}custom", Self::SET_TIME_PREFIX),
            CallbackData::SetTimeOff => write!(f, "{}off", Self::SET_TIME_PREFIX),
            CallbackData::Cancel => f.write_str("cancel_action"),
            CallbackData::NewsConfirm => f.write_str("news_confirm"),
            CallbackData::NewsCancel => f.write_str("news_cancel"),
        }
    }
}

/// Text buttons of the main reply keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuButton {
    Reminders,
    Feedback,
}

impl MenuButton {
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            MenuButton::Reminders => "⏰ Напоминания",
            MenuButton::Feedback => "💬 Написать отзыв",
        }
    }

    #[must_use]
    pub fn from_text(text: &str) -> Option<MenuButton> {
        [MenuButton::Reminders, MenuButton::Feedback]
            .into_iter()
            .find(|button| button.text() == text.trim())
    }
}

/// Where a chat is in a conversation with the bot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Idle,
    AwaitingFeedback,
    AwaitingReminderTime,
    /// Admin was asked for the post to broadcast.
    AwaitingNewsContent,
    /// Admin was shown a preview of this message and asked to confirm.
    AwaitingNewsConfirmation {
        from_chat: ChatId,
        message_id: MessageId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_time_parsing() {
        let time: ReminderTime = "09:30".parse().unwrap();
        assert_eq!((time.hour(), time.minute()), (9, 30));
        assert_eq!(time.to_string(), "09:30");

        // Single digit hour is the same reminder as the padded one.
        assert_eq!(" 9:30 ".parse::<ReminderTime>().unwrap(), time);
        assert_eq!("00:00".parse::<ReminderTime>().unwrap().to_string(), "00:00");
        assert_eq!("23:59".parse::<ReminderTime>().unwrap().to_string(), "23:59");
    }

    #[test]
    fn reminder_time_garbage() {
        for bad in [
            "", "24:00", "12:60", "12", "12:5", "123:00", "12:345", "ab:cd", "+1:30", "12:30:00",
            "12-30", "１２:３０",
        ] {
            assert!(bad.parse::<ReminderTime>().is_err(), "{bad:?} parsed");
        }
    }

    #[test]
    fn reminder_time_of_moment() {
        let moment = NaiveTime::from_hms_opt(22, 5, 59).unwrap();
        assert_eq!(ReminderTime::of(&moment).to_string(), "22:05");
    }

    #[test]
    fn next_minute_wraps() {
        let time: ReminderTime = "09:59".parse().unwrap();
        assert_eq!(time.next_minute().to_string(), "10:00");
        let time: ReminderTime = "23:59".parse().unwrap();
        assert_eq!(time.next_minute().to_string(), "00:00");
    }

    #[test]
    fn callback_data() {
        let morning = ReminderTime::new(8, 0).unwrap();
        for data in [
            CallbackData::SetTime(morning),
            CallbackData::SetTimeCustom,
            CallbackData::SetTimeOff,
            CallbackData::Cancel,
            CallbackData::NewsConfirm,
            CallbackData::NewsCancel,
        ] {
            assert_eq!(CallbackData::parse(&data.to_string()), Some(data));
        }

        assert_eq!(CallbackData::SetTime(morning).to_string(), "set_time_08:00");
        assert_eq!(
            CallbackData::parse("set_time_8:00"),
            Some(CallbackData::SetTime(morning))
        );
        assert_eq!(CallbackData::parse("set_time_later"), None);
        assert_eq!(CallbackData::parse("something_else"), None);
    }

    #[test]
    fn menu_buttons() {
        assert_eq!(
            MenuButton::from_text("⏰ Напоминания"),
            Some(MenuButton::Reminders)
        );
        assert_eq!(
            MenuButton::from_text(MenuButton::Feedback.text()),
            Some(MenuButton::Feedback)
        );
        assert_eq!(MenuButton::from_text("Напоминания"), None);
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(State::default(), State::Idle);
    }
}
