use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::Task;

#[derive(Debug, Error, Diagnostic)]
pub enum ClioError {
    #[error("generation service unavailable: {0}")]
    #[diagnostic(help("set GEMINI_API_KEY (or the variable named by api_key_env in clio.json)"))]
    Configuration(String),

    #[error("generation request failed: {0}")]
    UpstreamHttp(String),

    #[error("generation service returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("generation service returned no usable candidate: {0}")]
    UpstreamResponse(String),

    #[error("malformed {task} response: {reason} (excerpt: {excerpt:?})")]
    MalformedResponse {
        task: Task,
        reason: String,
        excerpt: String,
    },

    #[error("failed to persist saved collection: {0}")]
    Persistence(String),

    #[error("query must not be empty")]
    EmptyQuery,

    #[error("saved source not found: {0}")]
    SourceNotFound(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Upstream,
    MalformedResponse,
    Persistence,
    Input,
    Local,
}

impl ClioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClioError::Configuration(_) => ErrorKind::Configuration,
            ClioError::UpstreamHttp(_)
            | ClioError::UpstreamStatus { .. }
            | ClioError::UpstreamResponse(_) => ErrorKind::Upstream,
            ClioError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            ClioError::Persistence(_) => ErrorKind::Persistence,
            ClioError::EmptyQuery | ClioError::SourceNotFound(_) => ErrorKind::Input,
            ClioError::ConfigRead(_)
            | ClioError::ConfigParse(_)
            | ClioError::Filesystem(_)
            | ClioError::Clipboard(_) => ErrorKind::Local,
        }
    }

    /// Whether re-submitting the same request may succeed. The core never retries
    /// on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Upstream | ErrorKind::MalformedResponse
        )
    }

    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Configuration => "The research service is unavailable.",
            ErrorKind::Upstream | ErrorKind::MalformedResponse => {
                "Something went wrong while fetching sources. Try again."
            }
            ErrorKind::Persistence => {
                "Your saved sources could not be stored; they remain available for this session."
            }
            ErrorKind::Input => "Check your input and try again.",
            ErrorKind::Local => "A local error occurred.",
        }
    }
}
