//! Property-based test framework for the sourdine noise-filter adapter.
//!
//! Provides audio block generators and operation-sequence strategies for
//! exercising a filter the way a host pipeline would.
//!
//! # Usage
//!
//! ```ignore
//! use sourdine_proptest::generators::*;
//! use test_strategy::proptest;
//!
//! #[proptest]
//! fn my_test(#[strategy(filter_ops(32))] ops: Vec<FilterOp>) {
//!     // drive a filter with `ops`
//! }
//! ```

pub mod generators;

pub use proptest;
pub use test_strategy;
