// Crate error type
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("meditation session has already ended")]
    SessionClosed,

    #[error("no meditation session is open")]
    NoActiveSession,

    #[error("unknown route: {0}")]
    UnknownRoute(String),

    #[error("unknown card: {0}")]
    UnknownCard(String),

    #[error("settings error: {0}")]
    Settings(String),
}

pub type Result<T, E = PlayerError> = std::result::Result<T, E>;
