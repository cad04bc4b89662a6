//! Query token types.
//!
//! A [`QueryExpression`] is an ordered sequence of [`QueryToken`]s: statements
//! joined by connectives, with nested groups standing in for parenthesized
//! sub-expressions. The serde representation matches the JSON shape ORM
//! callers exchange:
//!
//! ```text
//! {
//!   "query": [
//!     {"type": "property", "key": "name", "value": "ab", "valueType": "string",
//!      "equalitySymbol": "=", "options": {"caseSensitive": true}},
//!     "OR",
//!     [{"type": "datesAfter", "key": "born", "date": "2020-01-01",
//!       "valueType": "date", "options": {"equalToAndAfter": true}}]
//!   ],
//!   "sort": {"key": "age", "order": "dsc"},
//!   "take": 2
//! }
//! ```

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::value::{Value, ValueType};

/// Comparison requested between a property and a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EqualitySymbol {
    /// Equal.
    #[default]
    #[serde(rename = "=")]
    Eq,
    /// Not equal.
    #[serde(rename = "!=", alias = "≠", alias = "<>")]
    Ne,
    /// Greater than.
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Gte,
    /// Less than.
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Lte,
}

impl EqualitySymbol {
    /// The symbol as written in a query.
    pub fn as_str(&self) -> &'static str {
        match self {
            EqualitySymbol::Eq => "=",
            EqualitySymbol::Ne => "!=",
            EqualitySymbol::Gt => ">",
            EqualitySymbol::Gte => ">=",
            EqualitySymbol::Lt => "<",
            EqualitySymbol::Lte => "<=",
        }
    }
}

impl fmt::Display for EqualitySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EqualitySymbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(EqualitySymbol::Eq),
            "!=" | "≠" | "<>" => Ok(EqualitySymbol::Ne),
            ">" => Ok(EqualitySymbol::Gt),
            ">=" => Ok(EqualitySymbol::Gte),
            "<" => Ok(EqualitySymbol::Lt),
            "<=" => Ok(EqualitySymbol::Lte),
            other => Err(Error::UnknownSymbol(other.to_string())),
        }
    }
}

/// Boolean connective joining two adjacent statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Connective {
    /// Both sides must hold.
    And,
    /// Either side may hold.
    Or,
}

impl Connective {
    /// The connective as written in a query.
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Connective {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(Connective::And),
            "OR" => Ok(Connective::Or),
            other => Err(Error::UnknownConnective(other.to_string())),
        }
    }
}

impl TryFrom<String> for Connective {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Connective> for String {
    fn from(value: Connective) -> Self {
        value.as_str().to_string()
    }
}

/// String matching flags of a property comparison.
///
/// `starts_with`, `ends_with` and `includes` are mutually exclusive; when
/// more than one is set the first in that order wins. None set means an
/// exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StringOptions {
    pub case_sensitive: bool,
    pub starts_with: bool,
    pub ends_with: bool,
    pub includes: bool,
}

/// How a string comparison anchors its pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMatch {
    /// Whole value.
    Exact,
    /// Value prefix.
    StartsWith,
    /// Value suffix.
    EndsWith,
    /// Anywhere in the value.
    Includes,
}

impl StringOptions {
    /// Resolve the matching mode from the flags.
    pub fn match_mode(&self) -> StringMatch {
        if self.starts_with {
            StringMatch::StartsWith
        } else if self.ends_with {
            StringMatch::EndsWith
        } else if self.includes {
            StringMatch::Includes
        } else {
            StringMatch::Exact
        }
    }

    /// Set flags for a matching mode, clearing the others.
    pub fn with_match(mut self, mode: StringMatch) -> Self {
        self.starts_with = mode == StringMatch::StartsWith;
        self.ends_with = mode == StringMatch::EndsWith;
        self.includes = mode == StringMatch::Includes;
        self
    }
}

/// Comparison of one property against a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyQuery {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub equality_symbol: EqualitySymbol,
    #[serde(default)]
    pub options: StringOptions,
}

impl PropertyQuery {
    /// Create a case-insensitive exact string comparison.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            value_type: ValueType::String,
            equality_symbol: EqualitySymbol::Eq,
            options: StringOptions::default(),
        }
    }

    /// Set the declared value type.
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Set the equality symbol.
    pub fn with_symbol(mut self, symbol: EqualitySymbol) -> Self {
        self.equality_symbol = symbol;
        self
    }

    /// Set case sensitivity.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.options.case_sensitive = case_sensitive;
        self
    }

    /// Set the string matching mode.
    pub fn matching(mut self, mode: StringMatch) -> Self {
        self.options = self.options.with_match(mode);
        self
    }
}

/// Inclusivity flag of an upper date bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatesBeforeOptions {
    pub equal_to_and_before: bool,
}

/// Inclusivity flag of a lower date bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatesAfterOptions {
    pub equal_to_and_after: bool,
}

/// Upper bound on a date property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatesBeforeQuery {
    pub key: String,
    pub date: Value,
    #[serde(default = "ValueType::date")]
    pub value_type: ValueType,
    #[serde(default)]
    pub options: DatesBeforeOptions,
}

/// Lower bound on a date property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatesAfterQuery {
    pub key: String,
    pub date: Value,
    #[serde(default = "ValueType::date")]
    pub value_type: ValueType,
    #[serde(default)]
    pub options: DatesAfterOptions,
}

/// A leaf of the query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Statement {
    /// Property comparison.
    Property(PropertyQuery),
    /// Upper date bound.
    DatesBefore(DatesBeforeQuery),
    /// Lower date bound.
    DatesAfter(DatesAfterQuery),
}

impl Statement {
    /// Property key this statement constrains.
    pub fn key(&self) -> &str {
        match self {
            Statement::Property(p) => &p.key,
            Statement::DatesBefore(d) => &d.key,
            Statement::DatesAfter(d) => &d.key,
        }
    }
}

/// One entry of a query sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryToken {
    /// `AND` / `OR`.
    Connective(Connective),
    /// Parenthesized sub-expression.
    Group(Vec<QueryToken>),
    /// Comparison leaf.
    Statement(Statement),
}

impl QueryToken {
    /// Check if this token is a connective.
    pub fn is_connective(&self) -> bool {
        matches!(self, QueryToken::Connective(_))
    }

    /// Get the connective, if this token is one.
    pub fn as_connective(&self) -> Option<Connective> {
        match self {
            QueryToken::Connective(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<Connective> for QueryToken {
    fn from(c: Connective) -> Self {
        QueryToken::Connective(c)
    }
}

impl From<Statement> for QueryToken {
    fn from(s: Statement) -> Self {
        QueryToken::Statement(s)
    }
}

impl From<PropertyQuery> for QueryToken {
    fn from(p: PropertyQuery) -> Self {
        QueryToken::Statement(Statement::Property(p))
    }
}

impl From<DatesBeforeQuery> for QueryToken {
    fn from(d: DatesBeforeQuery) -> Self {
        QueryToken::Statement(Statement::DatesBefore(d))
    }
}

impl From<DatesAfterQuery> for QueryToken {
    fn from(d: DatesAfterQuery) -> Self {
        QueryToken::Statement(Statement::DatesAfter(d))
    }
}

impl From<Vec<QueryToken>> for QueryToken {
    fn from(tokens: Vec<QueryToken>) -> Self {
        QueryToken::Group(tokens)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order.
    #[serde(rename = "asc")]
    Asc,
    /// Descending order.
    #[serde(rename = "dsc", alias = "desc")]
    Dsc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "dsc" | "desc" => Ok(SortOrder::Dsc),
            other => Err(Error::InvalidSort {
                order: other.to_string(),
            }),
        }
    }
}

/// Sort specification for search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Property to sort by.
    pub key: String,
    /// Sort direction.
    pub order: SortOrder,
}

impl SortSpec {
    /// Create a sort spec from an ascending flag.
    pub fn new(key: impl Into<String>, ascending: bool) -> Self {
        Self {
            key: key.into(),
            order: if ascending {
                SortOrder::Asc
            } else {
                SortOrder::Dsc
            },
        }
    }

    /// Whether results sort ascending.
    pub fn ascending(&self) -> bool {
        self.order == SortOrder::Asc
    }
}

/// A complete query: token sequence plus optional sort and limit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryExpression {
    /// Top-level token sequence. Empty matches everything.
    #[serde(default)]
    pub query: Vec<QueryToken>,
    /// Optional sort.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    /// Optional maximum number of results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<NonZeroU32>,
}

impl QueryExpression {
    /// Create an expression from a token sequence.
    pub fn new(query: Vec<QueryToken>) -> Self {
        Self {
            query,
            sort: None,
            take: None,
        }
    }

    /// An expression that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Check if the token sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Set the sort.
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the limit.
    pub fn with_take(mut self, take: NonZeroU32) -> Self {
        self.take = Some(take);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_connective_parsing() {
        assert_eq!("AND".parse::<Connective>().unwrap(), Connective::And);
        assert_eq!("OR".parse::<Connective>().unwrap(), Connective::Or);
        assert_eq!(
            "XOR".parse::<Connective>(),
            Err(Error::UnknownConnective("XOR".into()))
        );
    }

    #[test]
    fn test_symbol_parsing() {
        assert_eq!("≠".parse::<EqualitySymbol>().unwrap(), EqualitySymbol::Ne);
        assert_eq!(">=".parse::<EqualitySymbol>().unwrap(), EqualitySymbol::Gte);
        assert!(matches!(
            "==".parse::<EqualitySymbol>(),
            Err(Error::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_match_mode_precedence() {
        let opts = StringOptions {
            starts_with: true,
            ends_with: true,
            ..Default::default()
        };
        assert_eq!(opts.match_mode(), StringMatch::StartsWith);
        assert_eq!(StringOptions::default().match_mode(), StringMatch::Exact);

        let opts = opts.with_match(StringMatch::Includes);
        assert!(!opts.starts_with && !opts.ends_with && opts.includes);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Dsc);
        assert!(matches!(
            "sideways".parse::<SortOrder>(),
            Err(Error::InvalidSort { .. })
        ));
        assert!(!SortSpec::new("age", false).ascending());
    }

    #[test]
    fn test_deserialize_expression() {
        let json = r#"{
            "query": [
                {"type": "property", "key": "name", "value": "ab",
                 "equalitySymbol": "=", "options": {"caseSensitive": true}},
                "OR",
                [
                    {"type": "property", "key": "age", "value": 5,
                     "valueType": "number", "equalitySymbol": ">"},
                    "AND",
                    {"type": "datesBefore", "key": "born", "date": "2020-01-01",
                     "options": {"equalToAndBefore": true}}
                ]
            ],
            "sort": {"key": "age", "order": "dsc"},
            "take": 2
        }"#;
        let expr: QueryExpression = serde_json::from_str(json).unwrap();

        let expected = QueryExpression::new(vec![
            PropertyQuery::new("name", "ab").case_sensitive(true).into(),
            Connective::Or.into(),
            QueryToken::Group(vec![
                PropertyQuery::new("age", 5)
                    .with_value_type(ValueType::Number)
                    .with_symbol(EqualitySymbol::Gt)
                    .into(),
                Connective::And.into(),
                DatesBeforeQuery {
                    key: "born".into(),
                    date: Value::String("2020-01-01".into()),
                    value_type: ValueType::Date,
                    options: DatesBeforeOptions {
                        equal_to_and_before: true,
                    },
                }
                .into(),
            ]),
        ])
        .with_sort(SortSpec::new("age", false))
        .with_take(NonZeroU32::new(2).unwrap());

        assert_eq!(expr, expected);
    }

    #[test]
    fn test_unknown_connective_rejected() {
        let json = r#"{"query": [{"type": "property", "key": "a", "value": "x"}, "XOR",
                       {"type": "property", "key": "b", "value": "y"}]}"#;
        assert!(serde_json::from_str::<QueryExpression>(json).is_err());
    }

    #[test]
    fn test_zero_take_rejected() {
        let json = r#"{"query": [], "take": 0}"#;
        assert!(serde_json::from_str::<QueryExpression>(json).is_err());
    }

    #[test]
    fn test_serialize_connective_as_string() {
        let json = serde_json::to_string(&QueryToken::Connective(Connective::And)).unwrap();
        assert_eq!(json, r#""AND""#);
    }
}
