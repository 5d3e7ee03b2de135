use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("session error: {0}")]
    Session(String),

    #[error("recovery budget exhausted after {0} attempts")]
    MaxAttemptsExceeded(u32),

    #[error("cancelled by user")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("spool error: {0}")]
    Spool(String),
}
