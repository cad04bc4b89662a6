//! Native match tree produced by the compiler.
//!
//! The tree is typed so callers can inspect it; [`NativeQuery::to_document`]
//! renders it in the store's wire shape:
//!
//! ```text
//! {"$or": [{"name": {"$regex": "^ab$", "$options": "i"}},
//!          {"$and": [{"age": {"$gt": 5}}, {"born": {"$lte": ISODate(..)}}]}]}
//! ```

use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use ormbridge_proto::Value;

/// Comparison operator of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOperator {
    /// Operator name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "$eq",
            ComparisonOperator::Ne => "$ne",
            ComparisonOperator::Gt => "$gt",
            ComparisonOperator::Gte => "$gte",
            ComparisonOperator::Lt => "$lt",
            ComparisonOperator::Lte => "$lte",
        }
    }
}

/// A regular expression match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Escaped, anchored pattern text.
    pub regex: String,
    /// Adds the `i` option.
    pub case_insensitive: bool,
}

impl Pattern {
    fn to_document(&self) -> Document {
        if self.case_insensitive {
            doc! { "$regex": self.regex.clone(), "$options": "i" }
        } else {
            doc! { "$regex": self.regex.clone() }
        }
    }
}

/// Condition a single field must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `{field: null}`: missing or null.
    Null,
    /// `{field: value}`.
    Equals(Bson),
    /// `{field: {$op: value}}`.
    Compare(ComparisonOperator, Bson),
    /// `{field: {$regex, $options}}`.
    Matches(Pattern),
    /// `{field: {$not: {$regex, $options}}}`.
    NotMatches(Pattern),
}

impl Condition {
    fn to_bson(&self) -> Bson {
        match self {
            Condition::Null => Bson::Null,
            Condition::Equals(value) => value.clone(),
            Condition::Compare(op, value) => {
                let mut d = Document::new();
                d.insert(op.as_str(), value.clone());
                Bson::Document(d)
            }
            Condition::Matches(pattern) => Bson::Document(pattern.to_document()),
            Condition::NotMatches(pattern) => {
                Bson::Document(doc! { "$not": pattern.to_document() })
            }
        }
    }
}

/// A leaf: one field and its condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: String,
    pub condition: Condition,
}

impl Clause {
    pub fn new(field: impl Into<String>, condition: Condition) -> Self {
        Self {
            field: field.into(),
            condition,
        }
    }
}

/// Boolean tree over clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeQuery {
    /// Selects every record (`{}`).
    MatchAll,
    /// All children must match.
    And(Vec<NativeQuery>),
    /// At least one child must match.
    Or(Vec<NativeQuery>),
    /// Single field condition.
    Clause(Clause),
}

impl NativeQuery {
    /// Create a clause node.
    pub fn clause(field: impl Into<String>, condition: Condition) -> Self {
        NativeQuery::Clause(Clause::new(field, condition))
    }

    /// Check if this tree selects every record.
    pub fn is_match_all(&self) -> bool {
        matches!(self, NativeQuery::MatchAll)
    }

    /// Render as a match document.
    pub fn to_document(&self) -> Document {
        match self {
            NativeQuery::MatchAll => Document::new(),
            NativeQuery::And(children) => doc! { "$and": Self::render_all(children) },
            NativeQuery::Or(children) => doc! { "$or": Self::render_all(children) },
            NativeQuery::Clause(clause) => {
                let mut d = Document::new();
                d.insert(clause.field.clone(), clause.condition.to_bson());
                d
            }
        }
    }

    fn render_all(children: &[NativeQuery]) -> Vec<Bson> {
        children
            .iter()
            .map(|c| Bson::Document(c.to_document()))
            .collect()
    }
}

/// Convert a datetime to the store's native representation.
pub fn datetime_to_bson(dt: &DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_millis(dt.timestamp_millis()))
}

/// Convert a token value to BSON.
///
/// Integers that fit in 32 bits become `Int32`, larger ones `Int64`.
pub fn value_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Int(i) => {
            if *i >= i32::MIN as i64 && *i <= i32::MAX as i64 {
                Bson::Int32(*i as i32)
            } else {
                Bson::Int64(*i)
            }
        }
        Value::Float(f) => Bson::Double(*f),
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(value_to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_bson(v)))
                .collect(),
        ),
        Value::DateTime(dt) => datetime_to_bson(dt),
    }
}
