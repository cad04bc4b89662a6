//! ormbridge Benchmark Suite
//!
//! Criterion benchmarks for the query pipeline.
//!
//! # Benchmark Categories
//!
//! - **Compile**: token validation and tree construction for flat chains,
//!   nested groups and each string matching mode
//! - **Search**: adapter searches over the in-memory store, with and
//!   without filters, sort and limit

pub mod fixtures;
pub mod harness;

pub use fixtures::{chain_expression, generate_people, nested_expression, Scale};
pub use harness::BenchContext;
