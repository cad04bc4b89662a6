//! ormbridge - model-agnostic ORM queries for document stores.
//!
//! Re-exports the three layers under one roof:
//!
//! - [`proto`]: query tokens and the immutable [`QueryBuilder`]
//! - [`lang`]: the compiler from tokens to `$and` / `$or` match trees
//! - [`client`]: the datastore adapter and the in-memory store (feature `client`)
//!
//! # Example
//!
//! ```
//! use ormbridge::prelude::*;
//!
//! let expr = QueryBuilder::new()
//!     .property("status", "active", PropertyOptions::default().case_sensitive())
//!     .and()
//!     .dates_after("created", "2024-01-01", DateBoundOptions::inclusive())
//!     .sort("created", false)
//!     .compile();
//!
//! let pipeline = ormbridge::to_pipeline(&expr).unwrap();
//! assert_eq!(pipeline.len(), 1);
//! ```

pub use ormbridge_lang as lang;
pub use ormbridge_proto as proto;

#[cfg(feature = "client")]
pub use ormbridge_client as client;

pub use ormbridge_lang::{compile, to_pipeline, CompileError, CompileOptions, Compiler, NativeQuery};
pub use ormbridge_proto::{QueryBuilder, QueryExpression, Value};

#[cfg(feature = "client")]
pub use ormbridge_client::{AdapterConfig, DatastoreAdapter, Error, MemoryStore};

/// Common imports.
pub mod prelude {
    pub use ormbridge_lang::{CompileOptions, Compiler, DateSerialization};
    pub use ormbridge_proto::{
        Connective, DateBoundOptions, EqualitySymbol, PropertyOptions, QueryBuilder,
        QueryExpression, QueryToken, SortSpec, Value, ValueType,
    };

    #[cfg(feature = "client")]
    pub use ormbridge_client::{
        AdapterConfig, DatastoreAdapter, DocumentStore, MemoryStore, Model, ModelDefinition,
        ModelInstance, NamingStrategy, PlainInstance, PropertyType,
    };
}
