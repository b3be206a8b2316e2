// src/error.rs

use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeatError {
    #[error("not inside a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("repository has no working directory (bare repo?)")]
    NoWorkdir,

    #[error("{} is outside repository {}", .path.display(), .root.display())]
    OutsideRepository { path: PathBuf, root: PathBuf },

    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("history query timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HeatError>;

/// Anything serde can serialize, behind a trait object.
pub trait ToJson {
    fn to_json(&self) -> serde_json::Result<String>;
}

impl<T: Serialize + ?Sized> ToJson for T {
    fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// An error value of unknown shape reaching a reporting boundary.
pub enum ErrorValue<'a> {
    Error(&'a (dyn std::error::Error + 'a)),
    Text(&'a str),
    Structured(&'a dyn ToJson),
}

/// Turn any error value into display text. Never fails: values that
/// cannot be serialized produce an empty string.
pub fn error_message(value: &ErrorValue<'_>) -> String {
    match value {
        ErrorValue::Error(err) => err.to_string(),
        ErrorValue::Text(text) => (*text).to_string(),
        ErrorValue::Structured(value) => value.to_json().unwrap_or_default(),
    }
}

static BENIGN_BLAME: OnceLock<Regex> = OnceLock::new();

/// Blame failures that only mean "nothing to show for this line".
pub fn is_benign_blame_error(message: &str) -> bool {
    BENIGN_BLAME
        .get_or_init(|| {
            Regex::new(r"has only \d+ line|no such path|exists on disk, but not in")
                .expect("benign blame pattern is valid")
        })
        .is_match(message)
}

/// User-facing notification channel supplied by the host.
pub trait ErrorSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, message: &str) {
        tracing::error!("{message}");
    }
}
