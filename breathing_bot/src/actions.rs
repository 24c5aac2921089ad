use std::{future::Future, sync::Weak, time::Duration};

use bot_commons::teloxide_retry;
use chrono::{Local, NaiveTime, Timelike};
use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, MessageId, ParseMode, UserId},
    ApiError, Bot, RequestError,
};
use tokio::time::sleep;
use url::Url;

use crate::{
    database::{self, Database},
    keyboards::main_keyboard,
    texts,
    types::ReminderTime,
};

/// If the scheduler falls this many minutes behind, it stops catching up
/// and only fires for the current minute.
const MAX_CATCH_UP_MINUTES: u32 = 10;

/// If the clock goes back by up to this many minutes, the repeated minutes
/// are not fired again. Covers daylight saving time ending.
const MAX_REWIND_MINUTES: u32 = 120;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// What came out of sending something to a bunch of people.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub total: usize,
    pub delivered: usize,
    /// Recipients that will never get anything from us again, e.g. because
    /// they blocked the bot.
    pub unreachable: Vec<UserId>,
}

/// Returns `true` if this error means the user is gone for good, as
/// opposed to something going wrong this one time.
fn is_unreachable(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Api(
            ApiError::BotBlocked | ApiError::UserDeactivated | ApiError::ChatNotFound
        )
    )
}

/// Call `send` for every recipient one by one, pausing for `delay` in between.
///
/// Failures are logged and otherwise ignored; a single broken recipient
/// never stops the rest from getting their message.
pub async fn fan_out<F, Fut>(recipients: &[UserId], delay: Duration, mut send: F) -> FanOutReport
where
    F: FnMut(UserId) -> Fut,
    Fut: Future<Output = Result<(), RequestError>>,
{
    let mut report = FanOutReport {
        total: recipients.len(),
        ..FanOutReport::default()
    };

    for (i, &user) in recipients.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            sleep(delay).await;
        }

        match teloxide_retry!(send(user).await) {
            Ok(()) => report.delivered += 1,
            Err(e) if is_unreachable(&e) => {
                log::debug!("User {user} is unreachable: {e}");
                report.unreachable.push(user);
            }
            Err(e) => log::warn!("Failed sending to user {user}: {e}"),
        }
    }

    report
}

/// Copy a message to every recipient. Copying, unlike forwarding, keeps
/// any media and formatting but drops the "forwarded from" header.
pub async fn broadcast_copy(
    bot: &Bot,
    recipients: &[UserId],
    from_chat: ChatId,
    message_id: MessageId,
    delay: Duration,
) -> FanOutReport {
    let report = fan_out(recipients, delay, |user| async move {
        bot.copy_message(user, from_chat, message_id).await?;
        Ok(())
    })
    .await;

    log::info!(
        "Broadcast done: delivered {} of {}, {} unreachable",
        report.delivered,
        report.total,
        report.unreachable.len()
    );

    report
}

/// Send the daily reminder to everyone who has it set to `time`.
///
/// Reminders of users who can no longer be reached get turned off.
pub async fn send_due_reminders(
    bot: &Bot,
    database: &Database,
    time: ReminderTime,
    webapp_url: &Url,
    delay: Duration,
) -> Result<FanOutReport, database::Error> {
    let recipients = database.get_reminders_by_time(time).await?;
    if recipients.is_empty() {
        return Ok(FanOutReport::default());
    }

    let report = fan_out(&recipients, delay, |user| async move {
        bot.send_message(user, texts::REMINDER)
            .parse_mode(ParseMode::Html)
            .reply_markup(main_keyboard(webapp_url))
            .await?;
        Ok(())
    })
    .await;

    for &user in &report.unreachable {
        database.disable_reminder(user).await?;
    }

    log::info!(
        "Reminders for {time}: delivered {} of {}, disabled {}",
        report.delivered,
        report.total,
        report.unreachable.len()
    );

    Ok(report)
}

/// How long until the next minute starts.
fn until_next_minute(now: NaiveTime) -> Duration {
    // Leap seconds push nanoseconds past a full second; saturate for those.
    let into_minute =
        Duration::from_secs(now.second().into()) + Duration::from_nanos(now.nanosecond().into());
    Duration::from_secs(60).saturating_sub(into_minute)
}

/// How many minutes forward it is from `from` to `to`, wrapping around midnight.
fn minutes_ahead(from: ReminderTime, to: ReminderTime) -> u32 {
    let of_day = |time: ReminderTime| time.hour() * 60 + time.minute();
    (of_day(to) + MINUTES_PER_DAY - of_day(from)) % MINUTES_PER_DAY
}

/// Which minutes need firing now, given the last one that was fired.
fn minutes_to_fire(last_fired: Option<ReminderTime>, now: ReminderTime) -> Vec<ReminderTime> {
    let Some(last_fired) = last_fired else {
        return vec![now];
    };

    let ahead = minutes_ahead(last_fired, now);

    if ahead == 0 || MINUTES_PER_DAY - ahead <= MAX_REWIND_MINUTES {
        // Same minute, or the clock went back and these minutes were
        // already fired.
        return Vec::new();
    }

    if ahead > MAX_CATCH_UP_MINUTES {
        // Way behind, probably the clock jumped. Don't spam old reminders.
        return vec![now];
    }

    let mut minutes = Vec::new();
    let mut minute = last_fired;
    while minute != now {
        minute = minute.next_minute();
        minutes.push(minute);
    }
    minutes
}

/// Launches an ever-running loop that sends out reminders at the start of
/// every minute, local time. Stops once the database is gone.
pub async fn reminder_spinloop(
    bot: Bot,
    database: Weak<Database>,
    webapp_url: Url,
    delay: Duration,
) {
    let mut last_fired: Option<ReminderTime> = None;

    loop {
        sleep(until_next_minute(Local::now().time())).await;

        let Some(database) = database.upgrade() else {
            // No more database!
            return;
        };

        let now = ReminderTime::of(&Local::now());

        let minutes = minutes_to_fire(last_fired, now);
        for &minute in &minutes {
            if let Err(e) = send_due_reminders(&bot, &database, minute, &webapp_url, delay).await
            {
                log::error!("Database error while sending reminders for {minute}: {e:?}");
            }
        }

        // After the clock goes back, hold on to the latest minute fired
        // until the clock catches up with it again.
        if let Some(&minute) = minutes.last() {
            last_fired = Some(minute);
        }

        // Drop the upgraded database.
        drop(database);
    }
}
