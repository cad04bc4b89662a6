//! Fluent, immutable query builder.
//!
//! Every call returns a new [`QueryBuilder`] that shares the token list of
//! the builder it was called on, so any intermediate builder can be branched
//! into several continuations without copying or interfering:
//!
//! ```
//! use ormbridge_proto::{PropertyOptions, QueryBuilder};
//!
//! let base = QueryBuilder::new().property("status", "active", PropertyOptions::default());
//! let young = base.and().property("age", 18, PropertyOptions::number().lt()).compile();
//! let named = base.and().property("name", "al", PropertyOptions::default().starts_with()).compile();
//!
//! assert_eq!(young.query.len(), 3);
//! assert_eq!(named.query.len(), 3);
//! assert_eq!(base.compile().query.len(), 1);
//! ```
//!
//! The builder does not validate the sequence it produces; a malformed
//! sequence is only rejected when it is compiled.

use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::Error;
use crate::query::{
    Connective, DatesAfterOptions, DatesAfterQuery, DatesBeforeOptions, DatesBeforeQuery,
    EqualitySymbol, PropertyQuery, QueryExpression, QueryToken, SortOrder, SortSpec,
    StringMatch, StringOptions,
};
use crate::value::{Value, ValueType};

/// Options for [`QueryBuilder::property`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyOptions {
    pub value_type: ValueType,
    pub equality_symbol: EqualitySymbol,
    pub string: StringOptions,
}

impl PropertyOptions {
    /// Options for a numeric comparison (defaults to `=`).
    pub fn number() -> Self {
        Self {
            value_type: ValueType::Number,
            ..Default::default()
        }
    }

    /// Options for a comparison of the given type.
    pub fn of_type(value_type: ValueType) -> Self {
        Self {
            value_type,
            ..Default::default()
        }
    }

    pub fn symbol(mut self, symbol: EqualitySymbol) -> Self {
        self.equality_symbol = symbol;
        self
    }

    pub fn ne(self) -> Self {
        self.symbol(EqualitySymbol::Ne)
    }

    pub fn gt(self) -> Self {
        self.symbol(EqualitySymbol::Gt)
    }

    pub fn gte(self) -> Self {
        self.symbol(EqualitySymbol::Gte)
    }

    pub fn lt(self) -> Self {
        self.symbol(EqualitySymbol::Lt)
    }

    pub fn lte(self) -> Self {
        self.symbol(EqualitySymbol::Lte)
    }

    pub fn case_sensitive(mut self) -> Self {
        self.string.case_sensitive = true;
        self
    }

    pub fn starts_with(mut self) -> Self {
        self.string = self.string.with_match(StringMatch::StartsWith);
        self
    }

    pub fn ends_with(mut self) -> Self {
        self.string = self.string.with_match(StringMatch::EndsWith);
        self
    }

    pub fn includes(mut self) -> Self {
        self.string = self.string.with_match(StringMatch::Includes);
        self
    }
}

/// Options for [`QueryBuilder::dates_before`] and [`QueryBuilder::dates_after`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBoundOptions {
    /// Whether the bound date itself matches.
    pub inclusive: bool,
    /// Declared type of the bound value.
    pub value_type: ValueType,
}

impl Default for DateBoundOptions {
    fn default() -> Self {
        Self {
            inclusive: false,
            value_type: ValueType::Date,
        }
    }
}

impl DateBoundOptions {
    /// Inclusive bound.
    pub fn inclusive() -> Self {
        Self {
            inclusive: true,
            ..Default::default()
        }
    }

    /// Set the declared value type.
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }
}

/// Persistent list node: a token plus the list it was appended to.
#[derive(Debug)]
struct Node {
    token: QueryToken,
    prev: Option<Arc<Node>>,
}

/// Immutable accumulator of query tokens.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    tail: Option<Arc<Node>>,
    len: usize,
    sort: Option<SortSpec>,
    take: Option<NonZeroU32>,
}

impl QueryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, token: QueryToken) -> Self {
        Self {
            tail: Some(Arc::new(Node {
                token,
                prev: self.tail.clone(),
            })),
            len: self.len + 1,
            sort: self.sort.clone(),
            take: self.take,
        }
    }

    fn tokens(&self) -> Vec<QueryToken> {
        let mut tokens = Vec::with_capacity(self.len);
        let mut cursor = self.tail.as_deref();
        while let Some(node) = cursor {
            tokens.push(node.token.clone());
            cursor = node.prev.as_deref();
        }
        tokens.reverse();
        tokens
    }

    /// Number of tokens accumulated so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no tokens have been added.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a property comparison.
    pub fn property(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
        options: PropertyOptions,
    ) -> Self {
        self.push(
            PropertyQuery {
                key: key.into(),
                value: value.into(),
                value_type: options.value_type,
                equality_symbol: options.equality_symbol,
                options: options.string,
            }
            .into(),
        )
    }

    /// Append an `AND` connective.
    pub fn and(&self) -> Self {
        self.push(Connective::And.into())
    }

    /// Append an `OR` connective.
    pub fn or(&self) -> Self {
        self.push(Connective::Or.into())
    }

    /// Append a sub-expression built from a fresh builder.
    ///
    /// Sort and take set inside the closure are ignored.
    pub fn group<F>(&self, build: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let inner = build(QueryBuilder::new());
        self.push(QueryToken::Group(inner.tokens()))
    }

    /// Append an upper bound on a date property.
    pub fn dates_before(
        &self,
        key: impl Into<String>,
        date: impl Into<Value>,
        options: DateBoundOptions,
    ) -> Self {
        self.push(
            DatesBeforeQuery {
                key: key.into(),
                date: date.into(),
                value_type: options.value_type,
                options: DatesBeforeOptions {
                    equal_to_and_before: options.inclusive,
                },
            }
            .into(),
        )
    }

    /// Append a lower bound on a date property.
    pub fn dates_after(
        &self,
        key: impl Into<String>,
        date: impl Into<Value>,
        options: DateBoundOptions,
    ) -> Self {
        self.push(
            DatesAfterQuery {
                key: key.into(),
                date: date.into(),
                value_type: options.value_type,
                options: DatesAfterOptions {
                    equal_to_and_after: options.inclusive,
                },
            }
            .into(),
        )
    }

    /// Sort results by a property.
    pub fn sort(&self, key: impl Into<String>, ascending: bool) -> Self {
        Self {
            sort: Some(SortSpec::new(key, ascending)),
            ..self.clone()
        }
    }

    /// Sort results by a property using a textual order (`asc` / `dsc`).
    pub fn sort_by(&self, key: impl Into<String>, order: &str) -> Result<Self, Error> {
        let order: SortOrder = order.parse()?;
        Ok(Self {
            sort: Some(SortSpec {
                key: key.into(),
                order,
            }),
            ..self.clone()
        })
    }

    /// Limit the number of results.
    pub fn take(&self, n: i64) -> Result<Self, Error> {
        let take = u32::try_from(n)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(Error::InvalidTake { value: n })?;
        Ok(Self {
            take: Some(take),
            ..self.clone()
        })
    }

    /// Produce the finished expression.
    pub fn compile(&self) -> QueryExpression {
        QueryExpression {
            query: self.tokens(),
            sort: self.sort.clone(),
            take: self.take,
        }
    }
}
