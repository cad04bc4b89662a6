//! Compilation errors.

use std::fmt;

use ormbridge_proto::{EqualitySymbol, ValueType};
use thiserror::Error;

/// Location of a token: its index in each enclosing sequence, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPath(Vec<usize>);

impl TokenPath {
    /// The top-level sequence.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the `index`-th token inside this sequence.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Indices from the outermost sequence inward.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for TokenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("query");
        }
        f.write_str("query")?;
        for index in &self.0 {
            write!(f, "[{}]", index)?;
        }
        Ok(())
    }
}

/// Structural rule a token sequence broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedRule {
    /// Sequence starts with `AND`/`OR`.
    LeadingConnective,
    /// Sequence ends with `AND`/`OR`.
    TrailingConnective,
    /// Two connectives next to each other.
    AdjacentConnectives,
    /// Connectives do not join every adjacent pair of statements exactly once.
    ConnectiveCount,
}

/// Kinds of compilation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// The token sequence violates a structural rule.
    MalformedQuery(MalformedRule),
    /// Equality symbol not supported for the value type.
    SymbolUnhandled,
    /// A token in a position the compiler cannot translate.
    UnhandledToken,
}

/// Error during compilation (tokens to native tree).
#[derive(Debug, Clone, Error)]
pub struct CompileError {
    /// The error message.
    pub message: String,
    /// Token the error refers to.
    pub path: TokenPath,
    /// Error kind for programmatic handling.
    pub kind: CompileErrorKind,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.message, self.path)
    }
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(message: impl Into<String>, path: TokenPath, kind: CompileErrorKind) -> Self {
        Self {
            message: message.into(),
            path,
            kind,
        }
    }

    /// Create a malformed query error.
    pub fn malformed(rule: MalformedRule, message: impl Into<String>, path: TokenPath) -> Self {
        Self::new(
            format!("malformed query: {}", message.into()),
            path,
            CompileErrorKind::MalformedQuery(rule),
        )
    }

    /// Create an unhandled symbol error.
    pub fn symbol_unhandled(
        symbol: EqualitySymbol,
        value_type: ValueType,
        key: &str,
        path: TokenPath,
    ) -> Self {
        Self::new(
            format!(
                "Symbol {} is unhandled for {} type on '{}'",
                symbol, value_type, key
            ),
            path,
            CompileErrorKind::SymbolUnhandled,
        )
    }

    /// Check if this is a structural error.
    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, CompileErrorKind::MalformedQuery(_))
    }

    /// The broken structural rule, if any.
    pub fn malformed_rule(&self) -> Option<MalformedRule> {
        match self.kind {
            CompileErrorKind::MalformedQuery(rule) => Some(rule),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        assert_eq!(TokenPath::root().to_string(), "query");
        assert_eq!(TokenPath::root().child(2).child(0).to_string(), "query[2][0]");
    }

    #[test]
    fn test_error_formatting() {
        let err = CompileError::symbol_unhandled(
            EqualitySymbol::Gt,
            ValueType::String,
            "name",
            TokenPath::root().child(0),
        );
        let formatted = err.to_string();
        assert!(formatted.contains("Symbol > is unhandled for string type"));
        assert!(formatted.contains("query[0]"));
        assert!(!err.is_malformed());
    }
}
