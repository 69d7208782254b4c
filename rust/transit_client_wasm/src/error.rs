// Error types for the translation and live-channel layers.
// None of these cross the public fail-open operations; they are absorbed
// and logged where the operation degrades to its safe default.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("could not build request: {0}")]
    Request(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("could not read response body: {0}")]
    Body(String),
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("provider returned HTTP {0}")]
    Status(u16),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("invalid provider url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage rejected write to {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("stored value is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("failed to open socket to {url}: {reason}")]
    Open { url: String, reason: String },

    #[error("send failed: {0}")]
    Send(String),

    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("timer error: {0}")]
    Timer(String),

    #[error("location fetch failed: {0}")]
    Fetch(#[from] HttpError),

    #[error("location endpoint returned HTTP {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
