//! Leaf clause builders: property comparisons, string patterns, date bounds.

use bson::Bson;
use chrono::{DateTime, Utc};
use ormbridge_proto::{
    format_iso, parse_datetime, DatesAfterQuery, DatesBeforeQuery, EqualitySymbol,
    PropertyQuery, StringMatch, Value, ValueType,
};

use crate::compiler::DateSerialization;
use crate::error::{CompileError, TokenPath};
use crate::native::{datetime_to_bson, value_to_bson, ComparisonOperator, Condition, NativeQuery, Pattern};

/// Characters with meaning in a regular expression.
const REGEX_SPECIALS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Escape regex metacharacters so the text matches literally.
pub fn escape_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if REGEX_SPECIALS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Build the anchored pattern for a string matching mode.
pub fn string_pattern(raw: &str, mode: StringMatch) -> String {
    let escaped = escape_pattern(raw);
    match mode {
        StringMatch::StartsWith => format!("^{}", escaped),
        StringMatch::EndsWith => format!("{}$", escaped),
        StringMatch::Includes => escaped,
        StringMatch::Exact => format!("^{}$", escaped),
    }
}

/// Operator for a numeric comparison. `!=` is not part of the numeric table.
pub fn numeric_operator(symbol: EqualitySymbol) -> Option<ComparisonOperator> {
    match symbol {
        EqualitySymbol::Eq => Some(ComparisonOperator::Eq),
        EqualitySymbol::Gt => Some(ComparisonOperator::Gt),
        EqualitySymbol::Gte => Some(ComparisonOperator::Gte),
        EqualitySymbol::Lt => Some(ComparisonOperator::Lt),
        EqualitySymbol::Lte => Some(ComparisonOperator::Lte),
        EqualitySymbol::Ne => None,
    }
}

/// Compile a property comparison to a clause.
pub fn property_clause(query: &PropertyQuery, path: &TokenPath) -> Result<NativeQuery, CompileError> {
    let key = query.key.as_str();

    if query.value.is_absent() {
        return Ok(NativeQuery::clause(key, Condition::Null));
    }

    // Date-like values always compare against their serialized form.
    if let Value::DateTime(dt) = &query.value {
        return Ok(NativeQuery::clause(
            key,
            Condition::Equals(Bson::String(format_iso(dt))),
        ));
    }

    match query.value_type {
        ValueType::String => string_clause(query, path),
        ValueType::Number => {
            let op = numeric_operator(query.equality_symbol).ok_or_else(|| {
                CompileError::symbol_unhandled(
                    query.equality_symbol,
                    query.value_type,
                    key,
                    path.clone(),
                )
            })?;
            Ok(NativeQuery::clause(
                key,
                Condition::Compare(op, value_to_bson(&query.value)),
            ))
        }
        _ => Ok(NativeQuery::clause(
            key,
            Condition::Equals(value_to_bson(&query.value)),
        )),
    }
}

fn string_clause(query: &PropertyQuery, path: &TokenPath) -> Result<NativeQuery, CompileError> {
    let negated = match query.equality_symbol {
        EqualitySymbol::Eq => false,
        EqualitySymbol::Ne => true,
        other => {
            return Err(CompileError::symbol_unhandled(
                other,
                query.value_type,
                &query.key,
                path.clone(),
            ))
        }
    };

    let raw = query.value.to_text();
    let mode = query.options.match_mode();
    let case_sensitive = query.options.case_sensitive;
    let plain_exact = mode == StringMatch::Exact && case_sensitive;

    let condition = match (negated, plain_exact) {
        (false, true) => Condition::Equals(Bson::String(raw)),
        (true, true) => Condition::Compare(ComparisonOperator::Ne, Bson::String(raw)),
        (false, false) => Condition::Matches(Pattern {
            regex: string_pattern(&raw, mode),
            case_insensitive: !case_sensitive,
        }),
        (true, false) => Condition::NotMatches(Pattern {
            regex: string_pattern(&raw, mode),
            case_insensitive: !case_sensitive,
        }),
    };
    Ok(NativeQuery::clause(query.key.as_str(), condition))
}

/// Compile an upper date bound.
pub fn dates_before_clause(query: &DatesBeforeQuery, dates: DateSerialization) -> NativeQuery {
    let op = if query.options.equal_to_and_before {
        ComparisonOperator::Lte
    } else {
        ComparisonOperator::Lt
    };
    date_bound(&query.key, &query.date, query.value_type, op, dates)
}

/// Compile a lower date bound.
pub fn dates_after_clause(query: &DatesAfterQuery, dates: DateSerialization) -> NativeQuery {
    let op = if query.options.equal_to_and_after {
        ComparisonOperator::Gte
    } else {
        ComparisonOperator::Gt
    };
    date_bound(&query.key, &query.date, query.value_type, op, dates)
}

fn date_bound(
    key: &str,
    date: &Value,
    value_type: ValueType,
    op: ComparisonOperator,
    dates: DateSerialization,
) -> NativeQuery {
    NativeQuery::clause(key, Condition::Compare(op, bound_value(date, value_type, dates)))
}

fn bound_value(date: &Value, value_type: ValueType, dates: DateSerialization) -> Bson {
    if value_type != ValueType::Date {
        return value_to_bson(date);
    }
    let parsed = match date {
        Value::DateTime(dt) => Some(*dt),
        Value::String(s) => parse_datetime(s),
        // Numbers are epoch milliseconds.
        Value::Int(ms) => DateTime::<Utc>::from_timestamp_millis(*ms),
        Value::Float(ms) if ms.is_finite() => {
            DateTime::<Utc>::from_timestamp_millis(ms.trunc() as i64)
        }
        _ => None,
    };
    match (parsed, dates) {
        (Some(dt), DateSerialization::Native) => datetime_to_bson(&dt),
        (Some(dt), DateSerialization::IsoString) => Bson::String(format_iso(&dt)),
        (None, _) => value_to_bson(date),
    }
}
