use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    WebAppInfo,
};
use url::Url;

use crate::types::{CallbackData, MenuButton, ReminderTime};

/// Reminder times offered as one-tap buttons, with their labels.
pub const REMINDER_PRESETS: &[(&str, u32, u32)] = &[
    ("🌅 Утро", 8, 0),
    ("☀️ День", 14, 0),
    ("🌃 Вечер", 22, 0),
];

fn callback_button(text: impl Into<String>, data: CallbackData) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, data.to_string())
}

/// The keyboard under the input field, always there after `/start`.
#[must_use]
pub fn main_keyboard(webapp_url: &Url) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new("🧘 Открыть приложение").request(ButtonRequest::WebApp(
                WebAppInfo {
                    url: webapp_url.clone(),
                },
            )),
        ],
        vec![
            KeyboardButton::new(MenuButton::Reminders.text()),
            KeyboardButton::new(MenuButton::Feedback.text()),
        ],
    ])
    .resize_keyboard()
}

#[must_use]
pub fn reminders_keyboard() -> InlineKeyboardMarkup {
    let presets = REMINDER_PRESETS.iter().map(|&(label, hour, minute)| {
        let time = ReminderTime::new(hour, minute).expect("Preset reminder times are valid");
        vec![callback_button(
            format!("{label} ({time})"),
            CallbackData::SetTime(time),
        )]
    });

    InlineKeyboardMarkup::new(presets.chain([
        vec![callback_button("✏️ Своё время", CallbackData::SetTimeCustom)],
        vec![callback_button("🗑 Отключить", CallbackData::SetTimeOff)],
    ]))
}

#[must_use]
pub fn cancel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[callback_button("❌ Отмена", CallbackData::Cancel)]])
}

#[must_use]
pub fn confirm_news_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        [callback_button("✅ Отправить всем", CallbackData::NewsConfirm)],
        [callback_button("❌ Отмена", CallbackData::NewsCancel)],
    ])
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;

    fn payloads(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
        keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn reminder_buttons() {
        let keyboard = reminders_keyboard();
        assert_eq!(
            payloads(&keyboard),
            [
                "set_time_08:00",
                "set_time_14:00",
                "set_time_22:00",
                "set_time_custom",
                "set_time_off"
            ]
        );
        assert_eq!(keyboard.inline_keyboard[0][0].text, "🌅 Утро (08:00)");
        // Every button must parse back.
        for payload in payloads(&keyboard) {
            assert!(CallbackData::parse(&payload).is_some(), "{payload}");
        }
    }

    #[test]
    fn small_keyboards() {
        assert_eq!(payloads(&cancel_keyboard()), ["cancel_action"]);
        assert_eq!(
            payloads(&confirm_news_keyboard()),
            ["news_confirm", "news_cancel"]
        );
    }

    #[test]
    fn main_keyboard_layout() {
        let url = Url::parse("https://example.com/app/").unwrap();
        let keyboard = main_keyboard(&url);
        assert_eq!(keyboard.keyboard.len(), 2);
        assert!(matches!(
            &keyboard.keyboard[0][0].request,
            Some(ButtonRequest::WebApp(info)) if info.url == url
        ));
        assert_eq!(keyboard.keyboard[1][0].text, MenuButton::Reminders.text());
        assert_eq!(keyboard.keyboard[1][1].text, MenuButton::Feedback.text());
    }
}
