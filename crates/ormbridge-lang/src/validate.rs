//! Structural validation of token sequences.

use ormbridge_proto::QueryToken;

use crate::error::{CompileError, MalformedRule, TokenPath};

/// Check that connectives join every adjacent pair of statements exactly once.
///
/// Only the given sequence is checked; nested groups are validated when the
/// compiler descends into them. An empty sequence is valid.
pub fn validate_sequence(tokens: &[QueryToken], path: &TokenPath) -> Result<(), CompileError> {
    let (first, last) = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(()),
    };

    if first.is_connective() {
        return Err(CompileError::malformed(
            MalformedRule::LeadingConnective,
            "query cannot begin with an AND or OR",
            path.child(0),
        ));
    }
    if last.is_connective() {
        return Err(CompileError::malformed(
            MalformedRule::TrailingConnective,
            "query cannot end with an AND or OR",
            path.child(tokens.len() - 1),
        ));
    }

    if let Some(index) = tokens
        .windows(2)
        .position(|pair| pair[0].is_connective() && pair[1].is_connective())
    {
        return Err(CompileError::malformed(
            MalformedRule::AdjacentConnectives,
            "query cannot have two connectives in a row",
            path.child(index + 1),
        ));
    }

    let connectives = tokens.iter().filter(|t| t.is_connective()).count();
    let statements = tokens.len() - connectives;
    if connectives > 0 && connectives != statements - 1 {
        return Err(CompileError::malformed(
            MalformedRule::ConnectiveCount,
            format!(
                "{} statements need {} connectives, found {}",
                statements,
                statements - 1,
                connectives
            ),
            path.clone(),
        ));
    }

    Ok(())
}
