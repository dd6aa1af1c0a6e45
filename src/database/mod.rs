//! Database module
//!
//! This module handles database connections and the entity store
//! implementations the services run against.

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations, health_check};
pub use memory::InMemoryEntityStore;
pub use repositories::{UserRepository, CategoryRepository, EventRepository, RequestRepository};
pub use service::DatabaseService;
pub use store::EntityStore;
