//! Error types of the trainer.
//!
//! Nothing in here terminates the process, every failure is handed back to the
//! caller that drives the session.

use thiserror::Error;

/// Malformed authoring input, rejected before a pair or set is constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no words were given")]
    EmptyInput,

    #[error("some of the words were blank")]
    BlankToken,

    #[error("the word '{0}' was given more than once")]
    DuplicateToken(String),

    #[error("a pair needs words on both sides")]
    EmptySide,

    #[error("'{0}' is not a valid set name, use latin letters and digits starting with a letter")]
    InvalidSetName(String),

    #[error("a set named '{0}' already exists")]
    SetNameTaken(String),

    #[error("expected exactly 3 fields, got {0}")]
    WrongFieldCount(usize),
}

/// Failures of the durable set store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key could not be mapped to a live record.
    #[error("cannot resolve a set for key '{key}'")]
    PathResolution { key: String },

    #[error("failed to rename '{from}' to '{to}': {source}")]
    Rename {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no set stored under '{key}'")]
    NotFound { key: String },

    #[error("failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{key}': {message}")]
    Parse { key: String, message: String },

    #[error("failed to remove '{key}': {source}")]
    Remove {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while driving a training session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("the set has no word pairs to train")]
    EmptySet,

    #[error("the session was already started")]
    AlreadyStarted,

    #[error("the session is not asking questions")]
    NotRunning,

    #[error("the session is not waiting for a prune confirmation")]
    NotAwaitingConfirmation,

    #[error("the session has not finished its pass")]
    NotDone,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
