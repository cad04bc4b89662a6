//! ormbridge query tokens.
//!
//! This crate defines the model-agnostic query representation that callers
//! hand to a datastore adapter: a boolean expression over property
//! comparisons and date bounds, plus optional sort and limit.
//!
//! # Modules
//!
//! - [`value`] - Values compared against record properties
//! - [`query`] - Tokens, statements, sort and the full expression
//! - [`builder`] - Immutable fluent builder producing expressions
//! - [`error`] - Builder and parsing errors
//!
//! # Example
//!
//! ```
//! use ormbridge_proto::{PropertyOptions, QueryBuilder};
//!
//! let expr = QueryBuilder::new()
//!     .property("name", "al", PropertyOptions::default().starts_with())
//!     .or()
//!     .group(|b| {
//!         b.property("age", 30, PropertyOptions::number().gte())
//!             .and()
//!             .property("city", "Oslo", PropertyOptions::default().case_sensitive())
//!     })
//!     .sort("age", false)
//!     .take(10)
//!     .unwrap()
//!     .compile();
//!
//! assert_eq!(expr.query.len(), 3);
//! ```

pub mod builder;
pub mod error;
pub mod query;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use builder::{DateBoundOptions, PropertyOptions, QueryBuilder};
pub use query::{
    Connective, DatesAfterOptions, DatesAfterQuery, DatesBeforeOptions, DatesBeforeQuery,
    EqualitySymbol, PropertyQuery, QueryExpression, QueryToken, SortOrder, SortSpec, Statement,
    StringMatch, StringOptions,
};
pub use value::{format_iso, parse_datetime, Value, ValueType};
