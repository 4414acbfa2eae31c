use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can fail during a run.
///
/// Errors originate in the config loader or the GitHub client and cross the
/// orchestrator unchanged; the only handler is the boundary in `main`, which
/// picks a message per category. There is no retry or recovery anywhere.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config file is not valid JSON: {0}")]
    ConfigMalformed(serde_json::Error),

    #[error("missing required config field `{0}`")]
    ConfigFieldMissing(&'static str),

    #[error("github rejected the credentials (HTTP {status}): {body}")]
    Auth { status: StatusCode, body: String },

    #[error("not found on github: {what}")]
    NotFound { what: String },

    #[error("github api error (HTTP {status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("network error: {0}")]
    Network(reqwest::Error),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<reqwest::Error> for Error {
    /// Transport failures (timeout, DNS, refused/reset connections) are
    /// `Network`; a 2xx body that fails to decode is `Unexpected`. Status
    /// codes never reach this path, they are mapped where the response is
    /// read.
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Unexpected(err.into())
        } else {
            Error::Network(err)
        }
    }
}
