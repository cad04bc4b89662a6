//! ormbridge query compiler.
//!
//! Turns the token sequences produced by [`ormbridge_proto::QueryBuilder`]
//! into the nested `$and` / `$or` match trees understood by document stores.
//!
//! # Combination rules
//!
//! - An empty sequence matches every record.
//! - Statements with no connectives between them are AND'd together.
//! - Otherwise statements and connectives must alternate. The chain is read
//!   as overlapping `(left, connective, right)` triples and folded from the
//!   right, so `A OR B AND C OR D` becomes `A OR (B AND (C OR D))`.
//! - Nested groups are compiled recursively with the same rules.
//!
//! # Usage
//!
//! ```rust
//! use ormbridge_lang::{compile, to_pipeline};
//! use ormbridge_proto::{PropertyOptions, QueryBuilder};
//!
//! let expr = QueryBuilder::new()
//!     .property("age", 21, PropertyOptions::number().gte())
//!     .or()
//!     .property("name", "ada", PropertyOptions::default().starts_with())
//!     .compile();
//!
//! let tree = compile(&expr.query).unwrap();
//! assert!(!tree.is_match_all());
//!
//! let pipeline = to_pipeline(&expr).unwrap();
//! assert_eq!(pipeline.len(), 1);
//! assert!(pipeline[0].contains_key("$match"));
//! ```

pub mod clause;
pub mod compiler;
pub mod error;
pub mod native;
pub mod validate;

// Re-export main types
pub use compiler::{compile, to_pipeline, CompileOptions, Compiler, DateSerialization};
pub use error::{CompileError, CompileErrorKind, MalformedRule, TokenPath};
pub use native::{
    datetime_to_bson, value_to_bson, Clause, ComparisonOperator, Condition, NativeQuery, Pattern,
};
pub use validate::validate_sequence;
