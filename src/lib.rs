//! Rendezvous events platform core
//!
//! Event lifecycle management, participation admission with capacity limits,
//! and deduplicated view counting for an events platform backend.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{RendezvousError, Result};

// Re-export main components for easy access
pub use database::{DatabaseService, EntityStore, InMemoryEntityStore};
pub use services::{EventService, ParticipationService, ServiceFactory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
