//! Datastore adapter.
//!
//! Maps model-level persistence calls onto a [`DocumentStore`]: collection
//! names come from the configured [`NamingStrategy`](crate::NamingStrategy),
//! searches are compiled by [`Compiler`], and the store's internal `_id`
//! field is stripped from every record handed back.

use std::sync::Arc;

use bson::{doc, Bson, Document};
use futures::future::join_all;
use ormbridge_lang::Compiler;
use ormbridge_proto::{QueryExpression, SortSpec};
use tracing::{debug, instrument};

use crate::coerce::format_for_store;
use crate::config::AdapterConfig;
use crate::error::Error;
use crate::model::{Model, ModelInstance};
use crate::store::{DocumentCollection, DocumentStore, UpdateOptions, WriteModel};

/// Field the store uses for document identity.
pub const ID_FIELD: &str = "_id";

/// Records found by a search.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResult {
    pub instances: Vec<Document>,
    /// Reserved for pagination; always `None`.
    pub page: Option<Document>,
}

/// Adapter between model instances and a document store.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use bson::doc;
/// use ormbridge_client::{DatastoreAdapter, MemoryStore, ModelDefinition, PlainInstance};
/// use ormbridge_proto::QueryBuilder;
///
/// # futures::executor::block_on(async {
/// let adapter = DatastoreAdapter::new(Arc::new(MemoryStore::new()));
/// let users = Arc::new(ModelDefinition::new("Users"));
///
/// adapter
///     .save(&PlainInstance::new(users.clone(), doc! { "id": "u1", "name": "Ada" }))
///     .await?;
///
/// let found = adapter.search(&*users, &QueryBuilder::new().compile()).await?;
/// assert_eq!(found.instances, vec![doc! { "id": "u1", "name": "Ada" }]);
/// # Ok::<(), ormbridge_client::Error>(())
/// # }).unwrap();
/// ```
pub struct DatastoreAdapter {
    store: Arc<dyn DocumentStore>,
    config: AdapterConfig,
    compiler: Compiler,
}

impl DatastoreAdapter {
    /// Create an adapter with the default configuration.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, AdapterConfig::default())
    }

    /// Create an adapter with the given configuration.
    pub fn with_config(store: Arc<dyn DocumentStore>, config: AdapterConfig) -> Self {
        let compiler = Compiler::new(config.compile);
        Self {
            store,
            config,
            compiler,
        }
    }

    /// The configuration in force.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Collection name for a model.
    pub fn collection_name(&self, model: &dyn Model) -> String {
        self.config.naming.collection_name(model.name())
    }

    fn collection(&self, model: &dyn Model) -> Arc<dyn DocumentCollection> {
        let name = self.collection_name(model);
        self.store.collection(&self.config.database_name, &name)
    }

    /// Find records matching an expression.
    ///
    /// A non-empty expression runs as an aggregation with a single `$match`
    /// stage; an empty one is an unconditional find. Sort is applied before
    /// the limit.
    #[instrument(skip_all, fields(model = model.name()))]
    pub async fn search(
        &self,
        model: &dyn Model,
        expression: &QueryExpression,
    ) -> Result<SearchResult, Error> {
        let collection = self.collection(model);

        let mut cursor = if expression.is_empty() {
            collection.find(Document::new())
        } else {
            collection.aggregate(self.compiler.to_pipeline(expression)?)
        };
        if let Some(sort) = &expression.sort {
            cursor = cursor.sort(sort_document(sort));
        }
        if let Some(take) = expression.take {
            cursor = cursor.limit(i64::from(take.get()));
        }

        let records = cursor.to_vec().await?;
        debug!(collection = collection.name(), count = records.len(), "search complete");

        Ok(SearchResult {
            instances: records.into_iter().map(strip_id).collect(),
            page: None,
        })
    }

    /// Look up a record by identity.
    #[instrument(skip_all, fields(model = model.name()))]
    pub async fn retrieve(
        &self,
        model: &dyn Model,
        id: impl Into<Bson>,
    ) -> Result<Option<Document>, Error> {
        let id: Bson = id.into();
        let found = self
            .collection(model)
            .find_one(doc! { ID_FIELD: id })
            .await?;
        Ok(found.map(strip_id))
    }

    /// Upsert an instance by its primary key and return the record as stored.
    #[instrument(skip_all, fields(model = instance.model().name()))]
    pub async fn save(&self, instance: &dyn ModelInstance) -> Result<Document, Error> {
        let model = instance.model();
        let (key, record) = persistable(instance).await?;
        let record = format_for_store(model, record);

        let mut stored = record.clone();
        stored.insert(ID_FIELD, key.clone());

        let result = self
            .collection(model)
            .update_one(
                doc! { ID_FIELD: key },
                doc! { "$set": stored },
                UpdateOptions { upsert: true },
            )
            .await?;
        debug!(upserted = result.upserted, "saved");

        Ok(record)
    }

    /// Upsert many instances of one model in a single ordered bulk write.
    ///
    /// Every instance must belong to `model`; a mismatch fails before any
    /// write is issued.
    #[instrument(skip_all, fields(model = model.name(), count = instances.len()))]
    pub async fn bulk_insert(
        &self,
        model: &dyn Model,
        instances: &[&dyn ModelInstance],
    ) -> Result<(), Error> {
        if let Some(other) = instances
            .iter()
            .map(|i| i.model().name())
            .find(|name| *name != model.name())
        {
            return Err(Error::MixedModelType {
                expected: model.name().to_string(),
                found: other.to_string(),
            });
        }
        if instances.is_empty() {
            return Ok(());
        }

        let records = join_all(instances.iter().map(|i| persistable(*i))).await;
        let mut writes = Vec::with_capacity(records.len());
        for entry in records {
            let (key, record) = entry?;
            let mut stored = format_for_store(model, record);
            stored.insert(ID_FIELD, key.clone());
            writes.push(WriteModel::UpdateOne {
                filter: doc! { ID_FIELD: key },
                update: doc! { "$set": stored },
                upsert: true,
            });
        }

        let result = self.collection(model).bulk_write(writes).await?;
        debug!(
            upserted = result.upserted_count,
            modified = result.modified_count,
            "bulk insert complete"
        );
        Ok(())
    }

    /// Delete a record by identity. Missing records are not an error.
    #[instrument(skip_all, fields(model = model.name()))]
    pub async fn delete(&self, model: &dyn Model, id: impl Into<Bson>) -> Result<(), Error> {
        let id: Bson = id.into();
        let result = self
            .collection(model)
            .delete_one(doc! { ID_FIELD: id })
            .await?;
        debug!(deleted = result.deleted_count, "delete complete");
        Ok(())
    }

    /// Delete every record whose identity is in `ids`.
    #[instrument(skip_all, fields(model = model.name(), count = ids.len()))]
    pub async fn bulk_delete(&self, model: &dyn Model, ids: &[Bson]) -> Result<(), Error> {
        let result = self
            .collection(model)
            .delete_many(doc! { ID_FIELD: { "$in": ids.to_vec() } })
            .await?;
        debug!(deleted = result.deleted_count, "bulk delete complete");
        Ok(())
    }

    /// Total number of records stored for a model.
    #[instrument(skip_all, fields(model = model.name()))]
    pub async fn count(&self, model: &dyn Model) -> Result<u64, Error> {
        Ok(self.collection(model).count().await?)
    }
}

/// `{key: 1}` for ascending, `{key: -1}` for descending.
pub fn sort_document(sort: &SortSpec) -> Document {
    let mut spec = Document::new();
    spec.insert(sort.key.clone(), if sort.ascending() { 1 } else { -1 });
    spec
}

fn strip_id(mut record: Document) -> Document {
    record.remove(ID_FIELD);
    record
}

/// Record of an instance together with its primary key value.
async fn persistable(instance: &dyn ModelInstance) -> Result<(Bson, Document), Error> {
    let model = instance.model();
    let empty = || Error::EmptyRecord {
        model: model.name().to_string(),
    };

    let record = instance.to_record().await.ok_or_else(empty)?;
    if record.is_empty() {
        return Err(empty());
    }
    let key = match record.get(model.primary_key_name()) {
        None | Some(Bson::Null) => return Err(empty()),
        Some(key) => key.clone(),
    };
    Ok((key, record))
}
