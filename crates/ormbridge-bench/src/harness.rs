//! Benchmark context: a seeded in-memory store behind an adapter.

use std::sync::Arc;

use ormbridge_client::{
    DatastoreAdapter, MemoryStore, ModelDefinition, ModelInstance, PlainInstance, PropertyType,
};
use tokio::runtime::Runtime;
use tracing::info;

use crate::fixtures::{generate_people, Scale};

/// Adapter, model and runtime shared by search benchmarks.
pub struct BenchContext {
    pub runtime: Runtime,
    pub adapter: DatastoreAdapter,
    pub people: Arc<ModelDefinition>,
}

impl BenchContext {
    /// Build a context seeded with `scale` people.
    pub fn with_scale(scale: Scale) -> Self {
        init_tracing();

        let runtime = Runtime::new().expect("failed to start tokio runtime");
        let adapter = DatastoreAdapter::new(Arc::new(MemoryStore::new()));
        let people =
            Arc::new(ModelDefinition::new("People").with_property("joined", PropertyType::Datetime));

        let instances: Vec<PlainInstance> = generate_people(scale, 42)
            .into_iter()
            .map(|record| PlainInstance::new(people.clone(), record))
            .collect();
        let refs: Vec<&dyn ModelInstance> =
            instances.iter().map(|i| i as &dyn ModelInstance).collect();

        runtime
            .block_on(adapter.bulk_insert(&*people, &refs))
            .expect("failed to seed benchmark data");
        info!(count = refs.len(), "seeded benchmark store");

        Self {
            runtime,
            adapter,
            people,
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
