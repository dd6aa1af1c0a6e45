//! Database service layer
//!
//! This module provides the PostgreSQL-backed [`EntityStore`].

use std::time::Instant;

use async_trait::async_trait;

use crate::database::{
    CategoryRepository, DatabasePool, EntityStore, EventRepository, RequestRepository, UserRepository,
};
use crate::models::*;
use crate::utils::errors::{RendezvousError, Result};
use crate::utils::logging::log_database_operation;

/// Constraint keeping `confirmed_requests <= participant_limit` for limited events
const CAPACITY_CONSTRAINT: &str = "events_confirmed_within_limit";
/// Partial unique index: one non-canceled request per (requester, event)
const ACTIVE_REQUEST_INDEX: &str = "participation_requests_active_uq";

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub categories: CategoryRepository,
    pub events: EventRepository,
    pub requests: RequestRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            requests: RequestRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

/// Translate storage-level constraint violations into domain conflicts
fn map_constraint_violation(err: RendezvousError) -> RendezvousError {
    if let RendezvousError::Database(sqlx::Error::Database(db_err)) = &err {
        match db_err.constraint() {
            Some(CAPACITY_CONSTRAINT) => return RendezvousError::conflict("Participant limit reached"),
            Some(ACTIVE_REQUEST_INDEX) => return RendezvousError::conflict("Request already exists"),
            _ => {}
        }
    }
    err
}

#[async_trait]
impl EntityStore for DatabaseService {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        self.users.find_by_id(user_id).await
    }

    async fn find_category(&self, category_id: i64) -> Result<Option<Category>> {
        self.categories.find_by_id(category_id).await
    }

    async fn find_event_by_id(&self, event_id: i64) -> Result<Option<Event>> {
        self.events.find_by_id(event_id).await
    }

    async fn find_event_by_owner(&self, event_id: i64, owner_id: i64) -> Result<Option<Event>> {
        self.events.find_by_owner(event_id, owner_id).await
    }

    async fn insert_event(&self, record: CreateEventRecord) -> Result<Event> {
        self.events.create(record).await
    }

    async fn save_event(&self, event: &Event) -> Result<Event> {
        self.events.update(event).await.map_err(map_constraint_violation)
    }

    async fn increment_views(&self, event_id: i64) -> Result<()> {
        self.events.increment_views(event_id).await
    }

    async fn find_events_by_initiator(&self, owner_id: i64, offset: i64, limit: i64) -> Result<Vec<Event>> {
        self.events.get_user_events(owner_id, offset, limit).await
    }

    async fn search_events(&self, filter: &AdminEventFilter) -> Result<Vec<Event>> {
        self.events.search(filter).await
    }

    async fn find_published_events(&self, filter: &PublicEventFilter) -> Result<Vec<Event>> {
        self.events.search_published(filter).await
    }

    async fn find_requests_by_event(&self, event_id: i64) -> Result<Vec<ParticipationRequest>> {
        self.requests.get_by_event(event_id).await
    }

    async fn find_requests_by_ids(&self, request_ids: &[i64]) -> Result<Vec<ParticipationRequest>> {
        self.requests.get_by_ids(request_ids).await
    }

    async fn find_requests_by_requester(&self, requester_id: i64) -> Result<Vec<ParticipationRequest>> {
        self.requests.get_by_requester(requester_id).await
    }

    async fn find_request_by_requester(&self, request_id: i64, requester_id: i64) -> Result<Option<ParticipationRequest>> {
        self.requests.find_for_requester(request_id, requester_id).await
    }

    async fn insert_request(&self, record: CreateRequestRecord, confirmed_delta: i32) -> Result<ParticipationRequest> {
        let started = Instant::now();
        let event_id = record.event_id;

        let result = async {
            let mut tx = self.pool.begin().await?;
            let request = RequestRepository::create(&mut *tx, record).await?;
            EventRepository::adjust_confirmed_requests(&mut *tx, event_id, confirmed_delta).await?;
            tx.commit().await?;
            Ok::<_, RendezvousError>(request)
        }
        .await
        .map_err(map_constraint_violation);

        log_database_operation(
            "insert_request",
            "participation_requests",
            started.elapsed().as_millis() as u64,
            result.is_ok(),
        );
        result
    }

    async fn save_requests(&self, event_id: i64, requests: &[ParticipationRequest], confirmed_delta: i32) -> Result<()> {
        let started = Instant::now();

        let result = async {
            let mut tx = self.pool.begin().await?;
            for request in requests {
                RequestRepository::update_status(&mut *tx, request.id, request.status).await?;
            }
            EventRepository::adjust_confirmed_requests(&mut *tx, event_id, confirmed_delta).await?;
            tx.commit().await?;
            Ok::<_, RendezvousError>(())
        }
        .await
        .map_err(map_constraint_violation);

        log_database_operation(
            "save_requests",
            "participation_requests",
            started.elapsed().as_millis() as u64,
            result.is_ok(),
        );
        result
    }

    async fn count_confirmed_requests(&self, event_id: i64) -> Result<i64> {
        self.requests.count_confirmed(event_id).await
    }

    async fn exists_active_request(&self, requester_id: i64, event_id: i64) -> Result<bool> {
        self.requests.exists_active(requester_id, event_id).await
    }
}
