//! Stuff shared between bots: logging and runtime bootstrap,
//! request retrying, and a few small helpers.

use std::future::Future;

pub mod useful_methods;

#[doc(hidden)]
pub mod __reexports {
    pub use log;
    pub use teloxide::RequestError;
    pub use tokio::time::sleep;
}

/// How many times [`teloxide_retry`] attempts a request before giving up.
pub const RETRY_ATTEMPTS: u8 = 3;

/// Initialize logging and start the `closure` in an async runtime.
///
/// Logging filters are taken from the environment variable `RUST_LOG`,
/// or from `default_filters` if it's unset. This uses the crate
/// [pretty_env_logger][] internally, see its documentation for more details.
///
/// Timestamps are omitted when running as a systemd service, since
/// journald adds its own.
///
/// # Panics
///
/// Panics if the tokio runtime fails to build.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
pub fn start_everything(default_filters: &str, closure: impl Future<Output = ()>) {
    let filters = std::env::var("RUST_LOG")
        .ok()
        .filter(|x| !x.trim().is_empty())
        .unwrap_or_else(|| default_filters.to_string());

    let running_as_systemd_service = std::env::var_os("JOURNAL_STREAM").is_some();

    let mut builder = match running_as_systemd_service {
        true => pretty_env_logger::formatted_builder(),
        false => pretty_env_logger::formatted_timed_builder(),
    };

    builder.parse_filters(&filters);

    if builder.try_init().is_err() {
        log::error!("Tried to init logger twice!");
    }

    log::info!("hi");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build the tokio runtime!")
        .block_on(closure);
}

/// Run a request expression, retrying it if Telegram asks us to slow down.
///
/// The expression is evaluated anew on each attempt, so pass the whole
/// `bot.something(...).await` call. On [`RequestError::RetryAfter`] it sleeps
/// for the requested duration and tries again, up to [`RETRY_ATTEMPTS`] times
/// total. Any other result is returned as is.
///
/// [`RequestError::RetryAfter`]: teloxide::RequestError::RetryAfter
#[macro_export]
macro_rules! teloxide_retry {
    ($request:expr) => {{
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match $request {
                Err($crate::__reexports::RequestError::RetryAfter(wait))
                    if attempt < $crate::RETRY_ATTEMPTS =>
                {
                    $crate::__reexports::log::debug!(
                        "Flood wait for {:?}, attempt {}",
                        wait.duration(),
                        attempt
                    );
                    $crate::__reexports::sleep(wait.duration()).await;
                }
                result => break result,
            }
        }
    }};
}
