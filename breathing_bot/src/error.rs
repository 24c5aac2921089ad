use teloxide::{dispatching::dialogue::InMemStorageError, RequestError};

/// Anything that can go wrong while handling an update.
///
/// The dispatcher's default error handler logs these; the user simply
/// gets no answer.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] RequestError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Conversation state storage error: {0}")]
    Dialogue(#[from] InMemStorageError),
}

pub type HandlerResult = Result<(), BotError>;
