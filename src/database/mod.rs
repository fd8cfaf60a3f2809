//! Database module
//!
//! This module handles database connections and the storage backends

pub mod connection;
pub mod repositories;
pub mod store;
pub mod postgres;
pub mod memory;

// Re-export commonly used database components
pub use connection::{DatabasePool, create_pool, run_migrations, health_check};
pub use store::{Store, UnitOfWork, retry_transient};
pub use postgres::PgStore;
pub use memory::MemoryStore;
