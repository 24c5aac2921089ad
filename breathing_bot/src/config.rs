use std::{fmt, fs, io, time::Duration};

use teloxide::types::UserId;
use url::Url;

const DEFAULT_WEBAPP_URL: &str = "https://donecloud.github.io/breathing-app/";
const DEFAULT_DATABASE_URL: &str = "sqlite:users.sqlite";
const DEFAULT_BROADCAST_DELAY_MS: u64 = 50;

/// Key file the token is read from if `BOT_TOKEN` is not set.
const KEY_FILE: &str = match cfg!(debug_assertions) {
    true => "key_debug",
    false => "key",
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set and key file {path:?} could not be read: {source}")]
    NoToken {
        path: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("key file {0:?} is empty")]
    EmptyKeyFile(&'static str),
    #[error("ADMIN_ID is not a valid user ID: {0:?}")]
    BadAdminId(String),
    #[error("WEBAPP_URL is not a valid URL: {0}")]
    BadWebappUrl(#[from] url::ParseError),
    #[error("BROADCAST_DELAY_MS is not a number of milliseconds: {0:?}")]
    BadBroadcastDelay(String),
}

/// Everything the bot needs to know about its surroundings.
pub struct Config {
    pub token: String,
    /// The one user allowed to broadcast news and see stats, and who receives feedback.
    pub admin_id: Option<UserId>,
    /// Where the "open app" button leads.
    pub webapp_url: Url,
    pub database_url: String,
    /// Pause between consecutive messages when sending to many users.
    pub broadcast_delay: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<hidden>")
            .field("admin_id", &self.admin_id)
            .field("webapp_url", &self.webapp_url.as_str())
            .field("database_url", &self.database_url)
            .field("broadcast_delay", &self.broadcast_delay)
            .finish()
    }
}

impl Config {
    /// Read the configuration from environment variables, falling back to
    /// the key file for the token.
    ///
    /// # Errors
    /// Errors if the token can't be found anywhere or if any variable is malformed.
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), fs::read_to_string)
    }

    fn from_lookup(
        var: impl Fn(&str) -> Option<String>,
        read_key_file: impl FnOnce(&'static str) -> io::Result<String>,
    ) -> Result<Config, ConfigError> {
        // Empty values count as unset.
        let var = |key: &str| var(key).filter(|x| !x.trim().is_empty());

        let token = match var("BOT_TOKEN") {
            Some(token) => token.trim().to_string(),
            None => {
                let key = read_key_file(KEY_FILE).map_err(|source| ConfigError::NoToken {
                    path: KEY_FILE,
                    source,
                })?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(ConfigError::EmptyKeyFile(KEY_FILE));
                }
                key.to_string()
            }
        };

        let admin_id = var("ADMIN_ID")
            .map(|id| {
                id.trim()
                    .parse::<u64>()
                    .map(UserId)
                    .map_err(|_| ConfigError::BadAdminId(id))
            })
            .transpose()?;

        let webapp_url = match var("WEBAPP_URL") {
            Some(url) => Url::parse(url.trim())?,
            None => Url::parse(DEFAULT_WEBAPP_URL)?,
        };

        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let broadcast_delay = match var("BROADCAST_DELAY_MS") {
            Some(ms) => ms
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::BadBroadcastDelay(ms))?,
            None => DEFAULT_BROADCAST_DELAY_MS,
        };

        Ok(Config {
            token,
            admin_id,
            webapp_url,
            database_url,
            broadcast_delay: Duration::from_millis(broadcast_delay),
        })
    }

    /// Returns `true` if this user is the configured admin.
    #[must_use]
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_id == Some(user)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)], key_file: Option<&str>) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(
            |key| vars.get(key).cloned(),
            |_| match key_file {
                Some(contents) => Ok(contents.to_string()),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "no key file")),
            },
        )
    }

    #[test]
    fn defaults() {
        let config = config_from(&[("BOT_TOKEN", "123:abc")], None).unwrap();
        assert_eq!(config.token, "123:abc");
        assert_eq!(config.admin_id, None);
        assert_eq!(config.webapp_url.as_str(), DEFAULT_WEBAPP_URL);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.broadcast_delay, Duration::from_millis(50));
        assert!(!config.is_admin(UserId(1)));
    }

    #[test]
    fn everything_set() {
        let config = config_from(
            &[
                ("BOT_TOKEN", "123:abc"),
                ("ADMIN_ID", " 42 "),
                ("WEBAPP_URL", "https://example.com/app/"),
                ("DATABASE_URL", "sqlite::memory:"),
                ("BROADCAST_DELAY_MS", "0"),
            ],
            None,
        )
        .unwrap();
        assert!(config.is_admin(UserId(42)));
        assert!(!config.is_admin(UserId(43)));
        assert_eq!(config.webapp_url.as_str(), "https://example.com/app/");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.broadcast_delay, Duration::ZERO);
    }

    #[test]
    fn token_from_key_file() {
        let config = config_from(&[("BOT_TOKEN", "  ")], Some("456:def\n")).unwrap();
        assert_eq!(config.token, "456:def");

        assert!(matches!(
            config_from(&[], None),
            Err(ConfigError::NoToken { .. })
        ));
        assert!(matches!(
            config_from(&[], Some("\n")),
            Err(ConfigError::EmptyKeyFile(_))
        ));
    }

    #[test]
    fn malformed_values() {
        assert!(matches!(
            config_from(&[("BOT_TOKEN", "t"), ("ADMIN_ID", "@admin")], None),
            Err(ConfigError::BadAdminId(_))
        ));
        assert!(matches!(
            config_from(&[("BOT_TOKEN", "t"), ("WEBAPP_URL", "not a url")], None),
            Err(ConfigError::BadWebappUrl(_))
        ));
        assert!(matches!(
            config_from(&[("BOT_TOKEN", "t"), ("BROADCAST_DELAY_MS", "fast")], None),
            Err(ConfigError::BadBroadcastDelay(_))
        ));
    }
}
