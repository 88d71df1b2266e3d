use thiserror::Error;

use super::formula::FormulaError;

/// Errors that can arise while loading, saving or driving a character.
///
/// Expected rule violations (equip requirements, trade limits, spell target
/// mismatches) are never reported through this type; those operations return
/// `bool` or an outcome enum instead.
#[derive(Debug, Error)]
pub enum CharacterError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, seed files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON seed parsing errors.
    #[error("seed parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when fetching a row that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A stored column is missing or carries the wrong scalar type.
    #[error("bad column `{column}` for {name}: {reason}")]
    Column {
        name: String,
        column: &'static str,
        reason: String,
    },

    /// Fault raised by the quest engine outside of hydration.
    #[error("quest engine error: {0}")]
    QuestRuntime(#[from] QuestRuntimeError),

    /// A configured formula failed to compile.
    #[error("formula `{key}`: {source}")]
    Formula {
        key: String,
        #[source]
        source: FormulaError,
    },

    /// Internal error (poisoned locks, task join errors, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Distinguished runtime error of the quest engine. Raised when a stored
/// state name or progress blob does not fit the quest definition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuestRuntimeError {
    #[error("quest {quest}: unknown state `{state}`")]
    UnknownState { quest: i16, state: String },

    #[error("quest {quest}: malformed progress `{progress}`")]
    MalformedProgress { quest: i16, progress: String },
}
