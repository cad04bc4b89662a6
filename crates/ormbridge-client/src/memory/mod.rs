//! In-memory document store.
//!
//! Evaluates the filters and pipelines produced by the compiler against
//! documents held in process memory, so the adapter can run without an
//! external server.

mod matcher;

use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::trace;

use crate::store::{
    BulkWriteResult, CursorRequest, CursorSource, DeleteResult, DocumentCollection,
    DocumentStore, StoreResult, UpdateOptions, UpdateResult, WriteModel,
};

pub use matcher::{apply_limit, apply_update, matches, run_pipeline, sort_documents, upsert_seed};

/// Store holding collections in memory, keyed by database and name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<(String, String), Arc<MemoryCollection>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The concrete collection, created on first access.
    pub fn memory_collection(&self, database: &str, name: &str) -> Arc<MemoryCollection> {
        self.collections
            .entry((database.to_string(), name.to_string()))
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)))
            .clone()
    }

    /// Names of the collections created in `database`, sorted.
    pub fn collection_names(&self, database: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .iter()
            .filter(|entry| entry.key().0 == database)
            .map(|entry| entry.key().1.clone())
            .collect();
        names.sort();
        names
    }
}

impl DocumentStore for MemoryStore {
    fn collection(&self, database: &str, name: &str) -> Arc<dyn DocumentCollection> {
        self.memory_collection(database, name)
    }
}

/// A single in-memory collection in insertion order.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    docs: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: RwLock::new(Vec::new()),
        }
    }

    /// Copy of every stored document, `_id` included.
    pub fn snapshot(&self) -> Vec<Document> {
        self.docs.read().clone()
    }

    fn update_locked(
        docs: &mut Vec<Document>,
        filter: &Document,
        update: &Document,
        upsert: bool,
    ) -> StoreResult<UpdateResult> {
        for doc in docs.iter_mut() {
            if matches(doc, filter)? {
                let before = doc.clone();
                apply_update(doc, update)?;
                return Ok(UpdateResult {
                    matched_count: 1,
                    modified_count: u64::from(*doc != before),
                    upserted: false,
                });
            }
        }

        if !upsert {
            return Ok(UpdateResult::default());
        }

        let mut doc = upsert_seed(filter);
        apply_update(&mut doc, update)?;
        docs.push(doc);
        Ok(UpdateResult {
            matched_count: 0,
            modified_count: 0,
            upserted: true,
        })
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, request: CursorRequest) -> StoreResult<Vec<Document>> {
        trace!(collection = %self.name, request = ?request, "memory fetch");
        let snapshot = self.snapshot();
        let mut docs = match &request.source {
            CursorSource::Find(filter) => {
                let mut kept = Vec::new();
                for doc in snapshot {
                    if matches(&doc, filter)? {
                        kept.push(doc);
                    }
                }
                kept
            }
            CursorSource::Aggregate(pipeline) => run_pipeline(snapshot, pipeline)?,
        };

        if let Some(spec) = &request.sort {
            sort_documents(&mut docs, spec)?;
        }
        if let Some(limit) = request.limit {
            apply_limit(&mut docs, limit);
        }
        Ok(docs)
    }

    async fn find_one(&self, filter: Document) -> StoreResult<Option<Document>> {
        let docs = self.docs.read();
        for doc in docs.iter() {
            if matches(doc, &filter)? {
                return Ok(Some(doc.clone()));
            }
        }
        Ok(None)
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResult> {
        let mut docs = self.docs.write();
        Self::update_locked(&mut docs, &filter, &update, options.upsert)
    }

    async fn bulk_write(&self, models: Vec<WriteModel>) -> StoreResult<BulkWriteResult> {
        let mut docs = self.docs.write();
        let mut result = BulkWriteResult::default();
        for model in &models {
            match model {
                WriteModel::UpdateOne {
                    filter,
                    update,
                    upsert,
                } => result.record(Self::update_locked(&mut docs, filter, update, *upsert)?),
            }
        }
        Ok(result)
    }

    async fn delete_one(&self, filter: Document) -> StoreResult<DeleteResult> {
        let mut docs = self.docs.write();
        let mut position = None;
        for (i, doc) in docs.iter().enumerate() {
            if matches(doc, &filter)? {
                position = Some(i);
                break;
            }
        }
        Ok(match position {
            Some(i) => {
                docs.remove(i);
                DeleteResult { deleted_count: 1 }
            }
            None => DeleteResult::default(),
        })
    }

    async fn delete_many(&self, filter: Document) -> StoreResult<DeleteResult> {
        let mut docs = self.docs.write();
        // A filter error must leave the collection untouched
        let doomed = docs
            .iter()
            .map(|doc| matches(doc, &filter))
            .collect::<StoreResult<Vec<bool>>>()?;
        let mut flags = doomed.iter();
        docs.retain(|_| !flags.next().copied().unwrap_or(false));
        Ok(DeleteResult {
            deleted_count: doomed.iter().filter(|d| **d).count() as u64,
        })
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.docs.read().len() as u64)
    }
}
