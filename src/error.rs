use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised by the command layer itself, before or instead of any
/// lower-level I/O error.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("usage: {command} {usage}")]
    Usage { command: String, usage: &'static str },

    #[error("user {0} doesn't exist")]
    UserNotFound(String),

    #[error("user {0} already exists")]
    UserExists(String),

    #[error("no user is logged in; run `login <name>` first")]
    NotLoggedIn,
}

impl CommandError {
    pub fn usage(command: &str, usage: &'static str) -> Self {
        CommandError::Usage {
            command: command.to_string(),
            usage,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status: {}", .0.as_u16())]
    UnexpectedStatus(StatusCode),

    #[error("couldn't parse feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't locate home directory")]
    HomeNotFound,

    #[error("config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
