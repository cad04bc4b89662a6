//! Model-layer contracts consumed by the adapter.
//!
//! The adapter never builds models itself. It needs a name, a primary-key
//! name and property-type metadata from a [`Model`], and a plain record from
//! a [`ModelInstance`]. [`ModelDefinition`] and [`PlainInstance`] are simple
//! implementations for callers without an object layer of their own.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;

/// Declared type of a model property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Text,
    Integer,
    Number,
    Boolean,
    Date,
    Datetime,
    Object,
    Array,
    Uuid,
    ModelReference,
}

/// Description of a stored entity type.
pub trait Model: Send + Sync {
    /// Logical model name, e.g. `MyPluralNames` or `@scope/Items`.
    fn name(&self) -> &str;

    /// Field of the record holding its identity.
    fn primary_key_name(&self) -> &str;

    /// Property name to declared type.
    fn property_types(&self) -> &BTreeMap<String, PropertyType>;
}

/// A model instance that can produce its persistable record.
#[async_trait]
pub trait ModelInstance: Send + Sync {
    /// The model this instance belongs to.
    fn model(&self) -> &dyn Model;

    /// Plain record form, or `None` if the instance has nothing to persist.
    async fn to_record(&self) -> Option<Document>;
}

/// A plain model definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    name: String,
    primary_key_name: String,
    properties: BTreeMap<String, PropertyType>,
}

impl ModelDefinition {
    /// Create a definition with primary key `id` and no typed properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key_name: "id".to_string(),
            properties: BTreeMap::new(),
        }
    }

    /// Set the primary key field.
    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key_name = name.into();
        self
    }

    /// Declare a property type.
    pub fn with_property(mut self, name: impl Into<String>, ty: PropertyType) -> Self {
        self.properties.insert(name.into(), ty);
        self
    }
}

impl Model for ModelDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn primary_key_name(&self) -> &str {
        &self.primary_key_name
    }

    fn property_types(&self) -> &BTreeMap<String, PropertyType> {
        &self.properties
    }
}

/// An instance that is just a model plus a ready-made record.
#[derive(Clone)]
pub struct PlainInstance {
    model: Arc<dyn Model>,
    record: Document,
}

impl PlainInstance {
    pub fn new(model: Arc<dyn Model>, record: Document) -> Self {
        Self { model, record }
    }

    pub fn record(&self) -> &Document {
        &self.record
    }
}

impl std::fmt::Debug for PlainInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainInstance")
            .field("model", &self.model.name())
            .field("record", &self.record)
            .finish()
    }
}

#[async_trait]
impl ModelInstance for PlainInstance {
    fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    async fn to_record(&self) -> Option<Document> {
        if self.record.is_empty() {
            None
        } else {
            Some(self.record.clone())
        }
    }
}
