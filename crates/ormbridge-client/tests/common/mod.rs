//! Shared fixtures for adapter integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use parking_lot::Mutex;

use ormbridge_client::{
    BulkWriteResult, CursorRequest, DeleteResult, DocumentCollection, DocumentStore,
    StoreResult, UpdateOptions, UpdateResult, WriteModel,
};

/// Install a test-friendly subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A call observed by the recording store.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Collection { database: String, name: String },
    Fetch(CursorRequest),
    FindOne(Document),
    UpdateOne {
        filter: Document,
        update: Document,
        upsert: bool,
    },
    BulkWrite(Vec<WriteModel>),
    DeleteOne(Document),
    DeleteMany(Document),
    Count,
}

/// Store double that records every call and answers with canned data.
#[derive(Default)]
pub struct RecordingStore {
    calls: Arc<Mutex<Vec<Call>>>,
    canned: Vec<Document>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents returned by every read.
    pub fn with_documents(mut self, docs: Vec<Document>) -> Self {
        self.canned = docs;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Calls other than collection lookups.
    pub fn operations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Collection { .. }))
            .collect()
    }
}

impl DocumentStore for RecordingStore {
    fn collection(&self, database: &str, name: &str) -> Arc<dyn DocumentCollection> {
        self.calls.lock().push(Call::Collection {
            database: database.to_string(),
            name: name.to_string(),
        });
        Arc::new(RecordingCollection {
            name: name.to_string(),
            calls: self.calls.clone(),
            canned: self.canned.clone(),
        })
    }
}

struct RecordingCollection {
    name: String,
    calls: Arc<Mutex<Vec<Call>>>,
    canned: Vec<Document>,
}

impl RecordingCollection {
    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl DocumentCollection for RecordingCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, request: CursorRequest) -> StoreResult<Vec<Document>> {
        self.record(Call::Fetch(request));
        Ok(self.canned.clone())
    }

    async fn find_one(&self, filter: Document) -> StoreResult<Option<Document>> {
        self.record(Call::FindOne(filter));
        Ok(self.canned.first().cloned())
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResult> {
        self.record(Call::UpdateOne {
            filter,
            update,
            upsert: options.upsert,
        });
        Ok(UpdateResult {
            upserted: true,
            ..Default::default()
        })
    }

    async fn bulk_write(&self, models: Vec<WriteModel>) -> StoreResult<BulkWriteResult> {
        let upserted_count = models.len() as u64;
        self.record(Call::BulkWrite(models));
        Ok(BulkWriteResult {
            upserted_count,
            ..Default::default()
        })
    }

    async fn delete_one(&self, filter: Document) -> StoreResult<DeleteResult> {
        self.record(Call::DeleteOne(filter));
        Ok(DeleteResult::default())
    }

    async fn delete_many(&self, filter: Document) -> StoreResult<DeleteResult> {
        self.record(Call::DeleteMany(filter));
        Ok(DeleteResult::default())
    }

    async fn count(&self) -> StoreResult<u64> {
        self.record(Call::Count);
        Ok(self.canned.len() as u64)
    }
}
