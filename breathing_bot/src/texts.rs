//! Messages the bot sends. All of them are HTML, so anything coming
//! from users must go through [`encode_text`] first.

use html_escape::encode_text;

use crate::types::ReminderTime;

pub const NEWS_PROMPT: &str = concat!(
    "📰 <b>Создание новости</b>\n\n",
    "Пришлите мне пост, который вы хотите отправить пользователям.\n",
    "Это может быть просто текст или фото с подписью."
);
pub const NEWS_PREVIEW_HEADER: &str =
    "👁️ <b>Предпросмотр:</b>\n\nВот так будет выглядеть ваше сообщение:";
pub const NEWS_CONFIRM_QUESTION: &str = "Отправляем всем пользователям?";
pub const NEWS_CANCELLED: &str = "❌ Рассылка отменена.";

pub const FEEDBACK_PROMPT: &str =
    "Напишите ваше сообщение (отзыв, идею или вопрос), и я передам его разработчику:";
pub const FEEDBACK_SENT: &str = "✅ Сообщение отправлено! Спасибо за обратную связь.";
pub const FEEDBACK_FAILED: &str = "⚠️ Произошла ошибка при отправке.";
pub const FEEDBACK_NO_ADMIN: &str = "⚠️ Админ не настроен.";
pub const FEEDBACK_NOT_TEXT: &str =
    "Пожалуйста, отправьте отзыв текстом или нажмите кнопку Отмена.";

pub const REMINDERS_QUESTION: &str = "Когда вам напоминать о практике дыхания?";
pub const REMINDER_TIME_PROMPT: &str =
    "Введите время в формате <b>HH:MM</b> (например, 09:30):";
pub const REMINDER_TIME_INVALID: &str =
    "❌ Неверный формат. Попробуйте ещё раз (например, 09:00) или нажмите кнопку Отмена.";
pub const REMINDERS_OFF: &str = "🔕 Напоминания выключены.";
pub const REMINDER: &str = concat!(
    "🧘 <b>Время подышать!</b>\n\n",
    "Сделайте паузу на пару минут, чтобы восстановить силы."
);

pub const CANCELLED: &str = "Действие отменено.";

pub fn greeting(first_name: &str) -> String {
    format!(
        concat!(
            "Привет, {}! 🌿\n\n",
            "Я бот приложения <b>Breathing</b>.\n",
            "Используйте меню внизу, чтобы открыть приложение, ",
            "настроить напоминания или связаться со мной."
        ),
        encode_text(first_name)
    )
}

/// The reminders menu header, mentioning the current setting if it's on.
pub fn reminders_menu(current: Option<ReminderTime>) -> String {
    match current {
        Some(time) => format!(
            "{REMINDERS_QUESTION}\n\nСейчас напоминание стоит на <b>{time}</b>."
        ),
        None => REMINDERS_QUESTION.to_string(),
    }
}

pub fn reminder_set(time: ReminderTime) -> String {
    format!("✅ Готово! Буду напоминать каждый день в <b>{time}</b>.")
}

/// What the admin receives when someone leaves feedback.
pub fn feedback_for_admin(sender: &str, text: &str) -> String {
    format!(
        "📩 <b>Новый отзыв!</b>\nОт: {}\n\n{}",
        encode_text(sender),
        encode_text(text)
    )
}

pub fn news_preview_failed(error: &impl std::fmt::Display) -> String {
    format!(
        "⚠️ Ошибка предпросмотра: {}",
        encode_text(&error.to_string())
    )
}

pub fn broadcast_started(total: usize) -> String {
    format!("🚀 Начинаю рассылку для {total} пользователей...")
}

pub fn broadcast_finished(delivered: usize, total: usize) -> String {
    format!("✅ Рассылка завершена!\nДоставлено: <b>{delivered}</b> из {total}.")
}

pub fn stats(users: u64, active_reminders: u64) -> String {
    format!(
        "📊 Всего пользователей в базе: {users}\n⏰ Активных напоминаний: {active_reminders}"
    )
}
