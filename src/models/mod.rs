//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod category;
pub mod event;
pub mod request;

// Re-export commonly used models
pub use user::User;
pub use category::Category;
pub use event::{
    Event, EventState, Location, NewEvent, CreateEventRecord, UpdateEventRequest,
    OwnerStateAction, AdminStateAction, AdminEventFilter, PublicEventFilter, EventSort,
};
pub use request::{
    ParticipationRequest, RequestStatus, CreateRequestRecord,
    EventRequestStatusUpdateRequest, EventRequestStatusUpdateResult,
};
