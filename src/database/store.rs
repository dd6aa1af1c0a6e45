//! Entity store abstraction
//!
//! The lifecycle manager and the admission engine only talk to storage
//! through [`EntityStore`]. `DatabaseService` implements it on PostgreSQL and
//! `InMemoryEntityStore` implements it for tests and single-process runs.

use async_trait::async_trait;

use crate::models::{
    AdminEventFilter, Category, CreateEventRecord, CreateRequestRecord, Event,
    ParticipationRequest, PublicEventFilter, User,
};
use crate::utils::errors::Result;

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_category(&self, category_id: i64) -> Result<Option<Category>>;

    async fn find_event_by_id(&self, event_id: i64) -> Result<Option<Event>>;

    /// Event lookup restricted to its initiator
    async fn find_event_by_owner(&self, event_id: i64, owner_id: i64) -> Result<Option<Event>>;

    async fn insert_event(&self, record: CreateEventRecord) -> Result<Event>;

    /// Persist every field of `event` except the confirmed and view counters,
    /// which only move through their dedicated operations.
    async fn save_event(&self, event: &Event) -> Result<Event>;

    async fn increment_views(&self, event_id: i64) -> Result<()>;

    /// Newest id first
    async fn find_events_by_initiator(&self, owner_id: i64, offset: i64, limit: i64) -> Result<Vec<Event>>;

    /// Event date descending, paged by `filter.from` / `filter.size`
    async fn search_events(&self, filter: &AdminEventFilter) -> Result<Vec<Event>>;

    /// Published events matching `filter`, sorted and paged
    async fn find_published_events(&self, filter: &PublicEventFilter) -> Result<Vec<Event>>;

    /// All requests for the event, oldest first
    async fn find_requests_by_event(&self, event_id: i64) -> Result<Vec<ParticipationRequest>>;

    /// Requests whose id is in `request_ids`, in no particular order
    async fn find_requests_by_ids(&self, request_ids: &[i64]) -> Result<Vec<ParticipationRequest>>;

    async fn find_requests_by_requester(&self, requester_id: i64) -> Result<Vec<ParticipationRequest>>;

    async fn find_request_by_requester(
        &self,
        request_id: i64,
        requester_id: i64,
    ) -> Result<Option<ParticipationRequest>>;

    /// Insert a request and move the event's confirmed counter by
    /// `confirmed_delta` as one atomic step.
    async fn insert_request(&self, record: CreateRequestRecord, confirmed_delta: i32) -> Result<ParticipationRequest>;

    /// Persist status changes of `requests` and move the event's confirmed
    /// counter by `confirmed_delta` as one atomic step.
    async fn save_requests(
        &self,
        event_id: i64,
        requests: &[ParticipationRequest],
        confirmed_delta: i32,
    ) -> Result<()>;

    async fn count_confirmed_requests(&self, event_id: i64) -> Result<i64>;

    /// Whether a non-canceled request exists for the pair
    async fn exists_active_request(&self, requester_id: i64, event_id: i64) -> Result<bool>;
}
