//! Test helpers module
//!
//! This module provides utilities for testing EventDesk: an in-memory test
//! context with a pinned clock, account and event fixtures, and a PostgreSQL
//! helper backed by testcontainers.

#![allow(dead_code)]

pub mod database_helper;
pub mod failing_store;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use failing_store::*;
pub use test_context::*;
pub use test_data::*;
