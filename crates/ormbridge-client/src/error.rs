//! Adapter error types.

use thiserror::Error;

use crate::store::StoreError;

/// Adapter errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The query could not be compiled.
    #[error("compile error: {0}")]
    Compile(#[from] ormbridge_lang::CompileError),

    /// The query expression was invalid.
    #[error("query error: {0}")]
    Query(#[from] ormbridge_proto::Error),

    /// A bulk operation mixed instances of different models.
    #[error("Cannot have more than one model type: expected '{expected}', found '{found}'")]
    MixedModelType { expected: String, found: String },

    /// An instance produced no persistable record.
    #[error("instance of '{model}' produced an empty record")]
    EmptyRecord { model: String },

    /// The storage engine failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    /// Check if this error came from the storage engine.
    pub fn is_store(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}
