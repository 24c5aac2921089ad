//! Source code for the Breathing app's companion Telegram bot: onboarding,
//! daily breathing reminders, feedback to the developer, and news broadcasts.

/// Environment-driven configuration.
mod config;

/// Error type of update handlers.
mod error;

/// Various types used throughout.
mod types;

/// The database.
mod database;

/// Messages the bot sends.
mod texts;

/// Keyboards attached to those messages.
mod keyboards;

/// Sending things to many users, and the reminder scheduler.
mod actions;

/// Functions that handle events from Telegram.
mod handlers;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;
