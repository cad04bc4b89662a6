//! Query token errors.

use thiserror::Error;

/// Errors raised while building or parsing query tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// `take` was given something other than a positive integer.
    #[error("take must be a positive integer, got {value}")]
    InvalidTake { value: i64 },

    /// A sort order could not be understood.
    #[error("invalid sort order '{order}', expected 'asc' or 'dsc'")]
    InvalidSort { order: String },

    /// A connective token other than `AND` or `OR`.
    #[error("unrecognized connective '{0}'")]
    UnknownConnective(String),

    /// An equality symbol outside `=, !=, >, >=, <, <=`.
    #[error("unrecognized equality symbol '{0}'")]
    UnknownSymbol(String),

    /// A value type name that is not known.
    #[error("unrecognized value type '{0}'")]
    UnknownValueType(String),
}
