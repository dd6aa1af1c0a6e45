//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod user;
pub mod event;
pub mod request;

// Re-export repositories
pub use user::{UserRepository, CategoryRepository};
pub use event::EventRepository;
pub use request::RequestRepository;
