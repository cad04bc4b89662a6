//! Storage sink the adapter dispatches to.
//!
//! A [`DocumentStore`] hands out named [`DocumentCollection`]s. Collections
//! offer the handful of primitives the adapter needs; reads go through a
//! [`Cursor`] so sort and limit can be attached before the request is sent.

use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a storage engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The engine could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// A filter document used an unsupported shape or operator.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A pipeline stage was not understood.
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// An update document was rejected.
    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    /// A write failed.
    #[error("write failed: {0}")]
    Write(String),
}

/// Where a cursor reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorSource {
    /// `find(filter)`.
    Find(Document),
    /// `aggregate(pipeline)`.
    Aggregate(Vec<Document>),
}

/// A fully described read: source plus optional sort and limit.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorRequest {
    pub source: CursorSource,
    /// Sort specification, `{field: 1 | -1}`.
    pub sort: Option<Document>,
    pub limit: Option<i64>,
}

impl CursorRequest {
    fn new(source: CursorSource) -> Self {
        Self {
            source,
            sort: None,
            limit: None,
        }
    }
}

/// Options for [`DocumentCollection::update_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    /// Insert when nothing matches.
    pub upsert: bool,
}

/// Outcome of a single update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted: bool,
}

/// One operation of a bulk write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteModel {
    UpdateOne {
        filter: Document,
        update: Document,
        upsert: bool,
    },
}

/// Outcome of a bulk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkWriteResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
}

impl BulkWriteResult {
    /// Fold a single update into the totals.
    pub fn record(&mut self, update: UpdateResult) {
        self.matched_count += update.matched_count;
        self.modified_count += update.modified_count;
        if update.upserted {
            self.upserted_count += 1;
        }
    }
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// A named collection of documents.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;

    /// Execute a read built by a [`Cursor`].
    async fn fetch(&self, request: CursorRequest) -> StoreResult<Vec<Document>>;

    /// First document matching the filter.
    async fn find_one(&self, filter: Document) -> StoreResult<Option<Document>>;

    /// Update the first matching document.
    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResult>;

    /// Apply writes in order, stopping at the first failure.
    async fn bulk_write(&self, models: Vec<WriteModel>) -> StoreResult<BulkWriteResult>;

    /// Delete the first matching document.
    async fn delete_one(&self, filter: Document) -> StoreResult<DeleteResult>;

    /// Delete every matching document.
    async fn delete_many(&self, filter: Document) -> StoreResult<DeleteResult>;

    /// Number of documents in the collection.
    async fn count(&self) -> StoreResult<u64>;
}

impl dyn DocumentCollection {
    /// Start a read over documents matching `filter`.
    pub fn find(&self, filter: Document) -> Cursor<'_> {
        Cursor::new(self, CursorSource::Find(filter))
    }

    /// Start a read over the output of an aggregation pipeline.
    pub fn aggregate(&self, pipeline: Vec<Document>) -> Cursor<'_> {
        Cursor::new(self, CursorSource::Aggregate(pipeline))
    }
}

/// Lazy read against a collection.
///
/// Nothing is sent until [`Cursor::to_vec`] is awaited.
pub struct Cursor<'a> {
    collection: &'a dyn DocumentCollection,
    request: CursorRequest,
}

impl<'a> Cursor<'a> {
    fn new(collection: &'a dyn DocumentCollection, source: CursorSource) -> Self {
        Self {
            collection,
            request: CursorRequest::new(source),
        }
    }

    /// Sort results, `{field: 1 | -1}`.
    pub fn sort(mut self, spec: Document) -> Self {
        self.request.sort = Some(spec);
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, n: i64) -> Self {
        self.request.limit = Some(n);
        self
    }

    /// The request this cursor will issue.
    pub fn request(&self) -> &CursorRequest {
        &self.request
    }

    /// Run the read and collect every document.
    pub async fn to_vec(self) -> StoreResult<Vec<Document>> {
        self.collection.fetch(self.request).await
    }
}

/// A database handle that resolves collections by name.
pub trait DocumentStore: Send + Sync {
    /// Handle to `name` inside `database`.
    fn collection(&self, database: &str, name: &str) -> Arc<dyn DocumentCollection>;
}
