//! End-to-end adapter behavior over the in-memory store.

mod common;

use std::sync::Arc;

use bson::{doc, Bson, Document};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use ormbridge_client::{
    DatastoreAdapter, MemoryStore, ModelDefinition, ModelInstance, PlainInstance, PropertyType,
};
use ormbridge_proto::{DateBoundOptions, PropertyOptions, QueryBuilder, QueryExpression, Value};

use common::init_tracing;

struct Fixture {
    store: Arc<MemoryStore>,
    adapter: DatastoreAdapter,
    people: Arc<ModelDefinition>,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let adapter = DatastoreAdapter::new(store.clone());
        let people = Arc::new(
            ModelDefinition::new("People").with_property("born", PropertyType::Datetime),
        );
        Self {
            store,
            adapter,
            people,
        }
    }

    async fn seed(&self) {
        let rows = [
            doc! { "id": "1", "name": "Ada Lovelace", "age": 36, "born": "1815-12-10" },
            doc! { "id": "2", "name": "Alan Turing", "age": 41, "born": "1912-06-23" },
            doc! { "id": "3", "name": "Grace Hopper", "age": 85, "born": "1906-12-09" },
            doc! { "id": "4", "name": "Edsger Dijkstra", "age": 72, "born": "1930-05-11" },
            doc! { "id": "5", "name": "Barbara Liskov", "age": 84, "born": "1939-11-07" },
        ];
        let instances: Vec<PlainInstance> = rows
            .into_iter()
            .map(|r| PlainInstance::new(self.people.clone(), r))
            .collect();
        let refs: Vec<&dyn ModelInstance> =
            instances.iter().map(|i| i as &dyn ModelInstance).collect();
        self.adapter.bulk_insert(&*self.people, &refs).await.unwrap();
    }

    async fn ids(&self, expr: &QueryExpression) -> Vec<String> {
        let mut ids: Vec<String> = self
            .adapter
            .search(&*self.people, expr)
            .await
            .unwrap()
            .instances
            .iter()
            .filter_map(|d| d.get_str("id").ok().map(str::to_string))
            .collect();
        ids.sort();
        ids
    }
}

fn born(year: i32, month: u32, day: u32) -> Bson {
    Bson::DateTime(bson::DateTime::from_millis(
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .unwrap()
            .timestamp_millis(),
    ))
}

#[tokio::test]
async fn test_empty_search_returns_everything() {
    let fx = Fixture::new();
    fx.seed().await;

    let all = fx.ids(&QueryExpression::all()).await;
    assert_eq!(all, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(fx.adapter.count(&*fx.people).await.unwrap(), 5);
    assert_eq!(fx.store.collection_names("ormbridge"), vec!["people".to_string()]);
}

#[tokio::test]
async fn test_save_retrieve_round_trip() {
    let fx = Fixture::new();
    let record = doc! { "id": "9", "name": "Katherine Johnson", "born": "1918-08-26" };
    let saved = fx
        .adapter
        .save(&PlainInstance::new(fx.people.clone(), record))
        .await
        .unwrap();

    let fetched = fx.adapter.retrieve(&*fx.people, "9").await.unwrap().unwrap();
    assert_eq!(fetched, saved);
    assert_eq!(fetched.get("born"), Some(&born(1918, 8, 26)));
    assert!(fetched.get("_id").is_none());

    let raw: Vec<Document> = fx.store.memory_collection("ormbridge", "people").snapshot();
    assert_eq!(raw[0].get_str("_id").unwrap(), "9");
}

#[tokio::test]
async fn test_save_twice_updates_in_place() {
    let fx = Fixture::new();
    let first = PlainInstance::new(fx.people.clone(), doc! { "id": "7", "age": 1 });
    let second = PlainInstance::new(fx.people.clone(), doc! { "id": "7", "age": 2 });
    fx.adapter.save(&first).await.unwrap();
    fx.adapter.save(&second).await.unwrap();

    assert_eq!(fx.adapter.count(&*fx.people).await.unwrap(), 1);
    let fetched = fx.adapter.retrieve(&*fx.people, "7").await.unwrap().unwrap();
    assert_eq!(fetched.get_i32("age").unwrap(), 2);
}

#[tokio::test]
async fn test_string_matching_modes() {
    let fx = Fixture::new();
    fx.seed().await;

    let starts = QueryBuilder::new()
        .property("name", "a", PropertyOptions::default().starts_with())
        .compile();
    assert_eq!(fx.ids(&starts).await, vec!["1", "2"]);

    let ends = QueryBuilder::new()
        .property("name", "HOPPER", PropertyOptions::default().ends_with())
        .compile();
    assert_eq!(fx.ids(&ends).await, vec!["3"]);

    let includes = QueryBuilder::new()
        .property("name", "ra", PropertyOptions::default().includes().case_sensitive())
        .compile();
    assert_eq!(fx.ids(&includes).await, vec!["3", "4", "5"]);

    let not_ada = QueryBuilder::new()
        .property("name", "ada lovelace", PropertyOptions::default().ne())
        .compile();
    assert_eq!(fx.ids(&not_ada).await, vec!["2", "3", "4", "5"]);
}

#[tokio::test]
async fn test_numeric_comparisons_and_chain_grouping() {
    let fx = Fixture::new();
    fx.seed().await;

    // age < 40 OR (age > 80 AND name starts with "B")
    let expr = QueryBuilder::new()
        .property("age", 40, PropertyOptions::number().lt())
        .or()
        .property("age", 80, PropertyOptions::number().gt())
        .and()
        .property("name", "b", PropertyOptions::default().starts_with())
        .compile();
    assert_eq!(fx.ids(&expr).await, vec!["1", "5"]);

    let grouped = QueryBuilder::new()
        .group(|b| {
            b.property("age", 40, PropertyOptions::number().lt())
                .or()
                .property("age", 80, PropertyOptions::number().gt())
        })
        .and()
        .property("name", "g", PropertyOptions::default().starts_with())
        .compile();
    assert_eq!(fx.ids(&grouped).await, vec!["3"]);
}

#[tokio::test]
async fn test_date_bounds() {
    let fx = Fixture::new();
    fx.seed().await;

    let before = QueryBuilder::new()
        .dates_before("born", "1912-06-23", DateBoundOptions::default())
        .compile();
    assert_eq!(fx.ids(&before).await, vec!["1", "3"]);

    let before_inclusive = QueryBuilder::new()
        .dates_before("born", "1912-06-23", DateBoundOptions::inclusive())
        .compile();
    assert_eq!(fx.ids(&before_inclusive).await, vec!["1", "2", "3"]);

    let window = QueryBuilder::new()
        .dates_after("born", "1906-12-09", DateBoundOptions::default())
        .and()
        .dates_before("born", "1939-11-07", DateBoundOptions::inclusive())
        .compile();
    assert_eq!(fx.ids(&window).await, vec!["2", "4", "5"]);
}

#[tokio::test]
async fn test_epoch_millis_date_bounds() {
    let fx = Fixture::new();
    let events =
        Arc::new(ModelDefinition::new("Events").with_property("at", PropertyType::Datetime));
    fx.adapter
        .save(&PlainInstance::new(
            events.clone(),
            doc! { "id": "e1", "at": "2020-01-01T00:00:00Z" },
        ))
        .await
        .unwrap();

    let after_epoch = QueryBuilder::new()
        .dates_after("at", Value::Int(0), DateBoundOptions::default())
        .compile();
    let found = fx.adapter.search(&*events, &after_epoch).await.unwrap();
    assert_eq!(found.instances.len(), 1);

    // 2020-01-01T00:00:00Z in milliseconds.
    let before_new_year = QueryBuilder::new()
        .dates_before("at", Value::Int(1_577_836_800_000), DateBoundOptions::default())
        .compile();
    let found = fx.adapter.search(&*events, &before_new_year).await.unwrap();
    assert!(found.instances.is_empty());

    let through_new_year = QueryBuilder::new()
        .dates_before("at", Value::Int(1_577_836_800_000), DateBoundOptions::inclusive())
        .compile();
    let found = fx.adapter.search(&*events, &through_new_year).await.unwrap();
    assert_eq!(found.instances.len(), 1);
}

#[tokio::test]
async fn test_sort_and_take() {
    let fx = Fixture::new();
    fx.seed().await;

    let expr = QueryBuilder::new().sort("age", false).take(2).unwrap().compile();
    let result = fx.adapter.search(&*fx.people, &expr).await.unwrap();
    let ages: Vec<i32> = result
        .instances
        .iter()
        .filter_map(|d| d.get_i32("age").ok())
        .collect();
    assert_eq!(ages, vec![85, 84]);

    let filtered = QueryBuilder::new()
        .property("age", 50, PropertyOptions::number().gte())
        .sort("age", true)
        .take(2)
        .unwrap()
        .compile();
    let result = fx.adapter.search(&*fx.people, &filtered).await.unwrap();
    let ages: Vec<i32> = result
        .instances
        .iter()
        .filter_map(|d| d.get_i32("age").ok())
        .collect();
    assert_eq!(ages, vec![72, 84]);
}

#[tokio::test]
async fn test_delete_and_bulk_delete() {
    let fx = Fixture::new();
    fx.seed().await;

    fx.adapter.delete(&*fx.people, "1").await.unwrap();
    // Deleting a missing record is not an error.
    fx.adapter.delete(&*fx.people, "1").await.unwrap();
    assert_eq!(fx.adapter.count(&*fx.people).await.unwrap(), 4);

    fx.adapter
        .bulk_delete(&*fx.people, &[Bson::from("2"), Bson::from("3"), Bson::from("404")])
        .await
        .unwrap();
    assert_eq!(fx.ids(&QueryExpression::all()).await, vec!["4", "5"]);
}

#[tokio::test]
async fn test_null_match_for_absent_value() {
    let fx = Fixture::new();
    fx.seed().await;
    fx.adapter
        .save(&PlainInstance::new(fx.people.clone(), doc! { "id": "6", "age": 10 }))
        .await
        .unwrap();

    let expr = QueryBuilder::new()
        .property("name", "", PropertyOptions::default())
        .compile();
    assert_eq!(fx.ids(&expr).await, vec!["6"]);
}
