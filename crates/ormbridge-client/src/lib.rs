//! ormbridge client - datastore adapter for document stores.
//!
//! This crate maps model-level persistence (search, retrieve, save, bulk
//! insert, delete, bulk delete, count) onto a document store. Queries built
//! with [`ormbridge_proto::QueryBuilder`] are compiled by `ormbridge-lang`
//! and dispatched as aggregation pipelines.
//!
//! The store is a trait ([`DocumentStore`]); [`MemoryStore`] is an
//! in-process implementation that evaluates the compiled filters itself.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use bson::doc;
//! use ormbridge_client::{
//!     DatastoreAdapter, MemoryStore, ModelDefinition, ModelInstance, PlainInstance,
//! };
//! use ormbridge_proto::{PropertyOptions, QueryBuilder};
//!
//! # futures::executor::block_on(async {
//! let adapter = DatastoreAdapter::new(Arc::new(MemoryStore::new()));
//! let people = Arc::new(ModelDefinition::new("People"));
//!
//! let ada = PlainInstance::new(people.clone(), doc! { "id": "1", "name": "Ada", "age": 36 });
//! let bob = PlainInstance::new(people.clone(), doc! { "id": "2", "name": "Bob", "age": 25 });
//! let batch = [&ada as &dyn ModelInstance, &bob];
//! adapter.bulk_insert(&*people, &batch).await?;
//!
//! let query = QueryBuilder::new()
//!     .property("age", 30, PropertyOptions::number().gt())
//!     .compile();
//! let found = adapter.search(&*people, &query).await?;
//! assert_eq!(found.instances.len(), 1);
//! assert_eq!(adapter.count(&*people).await?, 2);
//! # Ok::<(), ormbridge_client::Error>(())
//! # }).unwrap();
//! ```

pub mod adapter;
pub mod coerce;
pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod naming;
pub mod store;

pub use adapter::{sort_document, DatastoreAdapter, SearchResult, ID_FIELD};
pub use coerce::format_for_store;
pub use config::{AdapterConfig, DEFAULT_DATABASE_NAME};
pub use error::Error;
pub use memory::{MemoryCollection, MemoryStore};
pub use model::{Model, ModelDefinition, ModelInstance, PlainInstance, PropertyType};
pub use naming::{kebab_collection_name, legacy_collection_name, NamingStrategy};
pub use store::{
    BulkWriteResult, Cursor, CursorRequest, CursorSource, DeleteResult, DocumentCollection,
    DocumentStore, StoreError, StoreResult, UpdateOptions, UpdateResult, WriteModel,
};

/// Re-export the query types.
pub use ormbridge_lang as lang;
pub use ormbridge_proto as proto;
