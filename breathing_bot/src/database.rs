use std::str::FromStr;

use chrono::Utc;
pub use sqlx::Error;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Executor, Row, Sqlite,
};
use teloxide::types::UserId;

use crate::types::ReminderTime;

type Pool = sqlx::Pool<Sqlite>;

pub struct Database {
    pool: Pool,
}

impl Database {
    /// Open (creating if necessary) the database at the given `sqlite:` URL.
    pub async fn new(url: &str) -> Result<Database, Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .pragma("cache_size", "-32768")
            .busy_timeout(std::time::Duration::from_secs(600));

        // An in-memory database lives and dies with its connection.
        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 32 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        // USERS:
        // id (key, autoincrement)
        // telegram_id (unique, i64 because sqlite doesn't support u64)
        // username (string, may be NULL)
        // full_name (string)
        // join_date (date+time in UTC)
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                telegram_id INTEGER UNIQUE NOT NULL,
                username TEXT NULL,
                full_name TEXT NOT NULL,
                join_date TEXT NOT NULL
            ) STRICT;",
        ))
        .await?;

        // REMINDERS (at most one per user):
        // user_id (key, telegram user ID)
        // reminder_time (string, zero-padded HH:MM)
        // is_active (0 for no, 1 for yes)
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS reminders (
                user_id INTEGER PRIMARY KEY NOT NULL,
                reminder_time TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            ) STRICT;",
        ))
        .await?;

        pool.execute(sqlx::query(
            "CREATE INDEX IF NOT EXISTS reminders_time_active
            ON reminders(reminder_time, is_active);",
        ))
        .await?;

        Ok(Database { pool })
    }

    /// Remember a user. Does nothing if they're already known.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn add_user(
        &self,
        id: UserId,
        username: Option<&str>,
        full_name: &str,
    ) -> Result<(), Error> {
        sqlx::query(
            "INSERT OR IGNORE INTO users(telegram_id, username, full_name, join_date)
            VALUES (?, ?, ?, ?);",
        )
        .bind(id.0 as i64)
        .bind(username)
        .bind(full_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// IDs of everyone who ever pressed `/start`.
    #[allow(clippy::cast_sign_loss)]
    pub async fn get_all_users(&self) -> Result<Vec<UserId>, Error> {
        sqlx::query("SELECT telegram_id FROM users ORDER BY id;")
            .map(|row: SqliteRow| UserId(row.get::<i64, _>(0) as u64))
            .fetch_all(&self.pool)
            .await
    }

    #[allow(clippy::cast_sign_loss)]
    pub async fn get_users_count(&self) -> Result<u64, Error> {
        sqlx::query("SELECT COUNT(*) FROM users;")
            .map(|row: SqliteRow| row.get::<i64, _>(0) as u64)
            .fetch_one(&self.pool)
            .await
    }

    /// Set the user's daily reminder, replacing the previous one and
    /// turning it on if it was off.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn set_reminder(&self, id: UserId, time: ReminderTime) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO reminders(user_id, reminder_time, is_active)
            VALUES (?, ?, 1)
        ON CONFLICT DO
            UPDATE SET reminder_time=excluded.reminder_time, is_active=1;",
        )
        .bind(id.0 as i64)
        .bind(time.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Turn the user's reminder off. The time is kept around.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn disable_reminder(&self, id: UserId) -> Result<(), Error> {
        sqlx::query("UPDATE reminders SET is_active=0 WHERE user_id=?;")
            .bind(id.0 as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns the user's reminder time and whether it's on, or [`None`]
    /// if they never set one.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn get_reminder(&self, id: UserId) -> Result<Option<(ReminderTime, bool)>, Error> {
        let row = sqlx::query("SELECT reminder_time, is_active FROM reminders WHERE user_id=?;")
            .bind(id.0 as i64)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let time = parse_reminder_time(&row)?;
        let is_active: bool = row.try_get("is_active")?;
        Ok(Some((time, is_active)))
    }

    /// IDs of users with an active reminder at exactly this time.
    #[allow(clippy::cast_sign_loss)]
    pub async fn get_reminders_by_time(&self, time: ReminderTime) -> Result<Vec<UserId>, Error> {
        sqlx::query("SELECT user_id FROM reminders WHERE reminder_time=? AND is_active=1;")
            .bind(time.to_string())
            .map(|row: SqliteRow| UserId(row.get::<i64, _>(0) as u64))
            .fetch_all(&self.pool)
            .await
    }

    #[allow(clippy::cast_sign_loss)]
    pub async fn get_active_reminders_count(&self) -> Result<u64, Error> {
        sqlx::query("SELECT COUNT(*) FROM reminders WHERE is_active=1;")
            .map(|row: SqliteRow| row.get::<i64, _>(0) as u64)
            .fetch_one(&self.pool)
            .await
    }
}

fn parse_reminder_time(row: &SqliteRow) -> Result<ReminderTime, Error> {
    let time: String = row.try_get("reminder_time")?;
    time.parse().map_err(|e| Error::ColumnDecode {
        index: "reminder_time".to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn database() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    fn time(s: &str) -> ReminderTime {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn users_are_added_once() {
        let db = database().await;
        assert_eq!(db.get_users_count().await.unwrap(), 0);

        db.add_user(UserId(1), Some("anna"), "Anna").await.unwrap();
        db.add_user(UserId(2), None, "Boris").await.unwrap();
        // Pressing /start again changes nothing.
        db.add_user(UserId(1), Some("anna_new"), "Anna New")
            .await
            .unwrap();

        assert_eq!(db.get_users_count().await.unwrap(), 2);
        assert_eq!(
            db.get_all_users().await.unwrap(),
            vec![UserId(1), UserId(2)]
        );
    }

    #[tokio::test]
    async fn big_user_ids_survive() {
        let db = database().await;
        let id = UserId(7_000_000_000);
        db.add_user(id, None, "Big").await.unwrap();
        db.set_reminder(id, time("08:00")).await.unwrap();
        assert_eq!(db.get_all_users().await.unwrap(), vec![id]);
        assert_eq!(
            db.get_reminders_by_time(time("08:00")).await.unwrap(),
            vec![id]
        );
    }

    #[tokio::test]
    async fn one_reminder_per_user() {
        let db = database().await;
        let user = UserId(10);

        assert_eq!(db.get_reminder(user).await.unwrap(), None);

        db.set_reminder(user, time("08:00")).await.unwrap();
        db.set_reminder(user, time("22:00")).await.unwrap();

        assert_eq!(
            db.get_reminder(user).await.unwrap(),
            Some((time("22:00"), true))
        );
        assert!(db
            .get_reminders_by_time(time("08:00"))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            db.get_reminders_by_time(time("22:00")).await.unwrap(),
            vec![user]
        );
        assert_eq!(db.get_active_reminders_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn disabled_reminders_do_not_fire() {
        let db = database().await;
        let user = UserId(10);
        let other = UserId(11);

        db.set_reminder(user, time("14:00")).await.unwrap();
        db.set_reminder(other, time("14:00")).await.unwrap();
        db.disable_reminder(user).await.unwrap();

        assert_eq!(
            db.get_reminders_by_time(time("14:00")).await.unwrap(),
            vec![other]
        );
        assert_eq!(
            db.get_reminder(user).await.unwrap(),
            Some((time("14:00"), false))
        );
        assert_eq!(db.get_active_reminders_count().await.unwrap(), 1);

        // Setting a time again turns it back on.
        db.set_reminder(user, time("09:30")).await.unwrap();
        assert_eq!(
            db.get_reminder(user).await.unwrap(),
            Some((time("09:30"), true))
        );
    }

    #[tokio::test]
    async fn disabling_without_reminder_is_harmless() {
        let db = database().await;
        db.disable_reminder(UserId(5)).await.unwrap();
        assert_eq!(db.get_reminder(UserId(5)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn reminders_match_normalized_time() {
        let db = database().await;
        db.set_reminder(UserId(3), time("9:05")).await.unwrap();
        assert_eq!(
            db.get_reminders_by_time(time("09:05")).await.unwrap(),
            vec![UserId(3)]
        );
    }
}
