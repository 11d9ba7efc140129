use std::fmt;
use std::io;
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by a [`crate::store::PageStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("page {0} not found")]
    NotFound(Uuid),
    #[error("page store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("page document is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("page store rejected the update: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] io::Error),
    #[error("config is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which optimistic mutation failed to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Position,
    Size,
    Add,
    Remove,
    Rename,
}

impl Operation {
    /// The user-facing message shown when this operation fails to save.
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::Position => "Failed to save position",
            Operation::Size => "Failed to save size",
            Operation::Add => "Failed to add widget",
            Operation::Remove => "Failed to delete widget",
            Operation::Rename => "Failed to rename widget",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_message())
    }
}

/// A rolled-back mutation. Always scoped to one widget and never fatal.
#[derive(Debug, Error)]
#[error("{operation}")]
pub struct CommitFailure {
    pub widget_id: Uuid,
    pub operation: Operation,
    #[source]
    pub source: StoreError,
}

impl CommitFailure {
    pub fn message(&self) -> &'static str {
        self.operation.failure_message()
    }
}
