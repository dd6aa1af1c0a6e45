//! Test helpers module
//!
//! Seeded in-memory service context, a mock stats server, and an optional
//! PostgreSQL database for store-level tests.

#![allow(dead_code)]

pub mod database_helper;
pub mod stats_mock;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use stats_mock::*;
pub use test_context::*;
pub use test_data::*;
