//! Data and query generation for benchmarks.
//!
//! Generators are seeded so runs are reproducible.

use bson::{doc, Document};
use ormbridge_proto::{DateBoundOptions, PropertyOptions, QueryBuilder, QueryExpression};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug, Default)]
pub enum Scale {
    /// 10 records. Use for quick iteration.
    Tiny,
    /// 100 records.
    Small,
    /// 2,000 records.
    #[default]
    Medium,
    /// 20,000 records.
    Large,
}

impl Scale {
    /// Record count for this scale.
    pub fn count(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 100,
            Scale::Medium => 2_000,
            Scale::Large => 20_000,
        }
    }
}

const STATUSES: &[&str] = &["active", "inactive", "pending", "banned"];

/// Generate `people` records: id, name, age, status, joined.
pub fn generate_people(scale: Scale, seed: u64) -> Vec<Document> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..scale.count())
        .map(|i| {
            let suffix: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(6)
                .map(char::from)
                .collect();
            let year = rng.gen_range(2000..2024);
            let month = rng.gen_range(1..=12);
            doc! {
                "id": format!("p{}", i),
                "name": format!("Person_{}_{}", i, suffix),
                "age": rng.gen_range(18..90_i32),
                "status": STATUSES[rng.gen_range(0..STATUSES.len())],
                "joined": format!("{}-{:02}-01", year, month),
            }
        })
        .collect()
}

/// A flat chain of `links` comparisons joined by alternating OR / AND.
pub fn chain_expression(links: usize) -> QueryExpression {
    let mut builder = QueryBuilder::new();
    for i in 0..links {
        if i > 0 {
            builder = if i % 2 == 1 { builder.or() } else { builder.and() };
        }
        builder = builder.property("age", 20 + i as i64, PropertyOptions::number().gte());
    }
    builder.compile()
}

/// Groups nested `depth` levels deep, each level adding a string and a date test.
pub fn nested_expression(depth: usize) -> QueryExpression {
    fn level(builder: QueryBuilder, remaining: usize) -> QueryBuilder {
        let builder = builder
            .property("status", "active", PropertyOptions::default())
            .and()
            .dates_after("joined", "2010-01-01", DateBoundOptions::default());
        if remaining == 0 {
            builder
        } else {
            builder.or().group(|b| level(b, remaining - 1))
        }
    }
    level(QueryBuilder::new(), depth).compile()
}
