//! In-memory entity store
//!
//! Mirrors the PostgreSQL schema rules (one active request per requester and
//! event, confirmed counter within the participant limit) so that services
//! behave the same against either backend.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::database::EntityStore;
use crate::models::*;
use crate::utils::errors::{RendezvousError, Result};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<i64, User>,
    categories: HashMap<i64, Category>,
    events: BTreeMap<i64, Event>,
    requests: BTreeMap<i64, ParticipationRequest>,
    next_event_id: i64,
    next_request_id: i64,
}

impl Tables {
    /// Apply `delta` to the event's confirmed counter, enforcing the capacity rule
    fn adjust_confirmed(&mut self, event_id: i64, delta: i32) -> Result<()> {
        let event = self
            .events
            .get_mut(&event_id)
            .ok_or_else(|| RendezvousError::event_not_found(event_id))?;

        let updated = (event.confirmed_requests + delta).max(0);
        if event.participant_limit > 0 && updated > event.participant_limit {
            return Err(RendezvousError::conflict("Participant limit reached"));
        }

        event.confirmed_requests = updated;
        Ok(())
    }
}

fn page<T>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    tables: RwLock<Tables>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user
    pub async fn add_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }

    /// Seed a category
    pub async fn add_category(&self, category: Category) {
        self.tables.write().await.categories.insert(category.id, category);
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn find_category(&self, category_id: i64) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&category_id).cloned())
    }

    async fn find_event_by_id(&self, event_id: i64) -> Result<Option<Event>> {
        Ok(self.tables.read().await.events.get(&event_id).cloned())
    }

    async fn find_event_by_owner(&self, event_id: i64, owner_id: i64) -> Result<Option<Event>> {
        Ok(self
            .tables
            .read()
            .await
            .events
            .get(&event_id)
            .filter(|event| event.initiator_id == owner_id)
            .cloned())
    }

    async fn insert_event(&self, record: CreateEventRecord) -> Result<Event> {
        let mut tables = self.tables.write().await;
        tables.next_event_id += 1;

        let event = Event {
            id: tables.next_event_id,
            title: record.title,
            annotation: record.annotation,
            description: record.description,
            category_id: record.category_id,
            initiator_id: record.initiator_id,
            location: record.location,
            paid: record.paid,
            participant_limit: record.participant_limit,
            request_moderation: record.request_moderation,
            created_on: record.created_on,
            published_on: None,
            event_date: record.event_date,
            confirmed_requests: 0,
            views: 0,
            state: EventState::Pending,
        };

        tables.events.insert(event.id, event.clone());
        debug!(event_id = event.id, "Event stored in memory");
        Ok(event)
    }

    async fn save_event(&self, event: &Event) -> Result<Event> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .events
            .get_mut(&event.id)
            .ok_or_else(|| RendezvousError::event_not_found(event.id))?;

        if event.participant_limit > 0 && stored.confirmed_requests > event.participant_limit {
            return Err(RendezvousError::conflict("Participant limit reached"));
        }

        let confirmed_requests = stored.confirmed_requests;
        let views = stored.views;
        *stored = Event {
            confirmed_requests,
            views,
            ..event.clone()
        };

        Ok(stored.clone())
    }

    async fn increment_views(&self, event_id: i64) -> Result<()> {
        if let Some(event) = self.tables.write().await.events.get_mut(&event_id) {
            event.views += 1;
        }
        Ok(())
    }

    async fn find_events_by_initiator(&self, owner_id: i64, offset: i64, limit: i64) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        let events: Vec<Event> = tables
            .events
            .values()
            .rev()
            .filter(|event| event.initiator_id == owner_id)
            .cloned()
            .collect();

        Ok(page(events, offset, limit))
    }

    async fn search_events(&self, filter: &AdminEventFilter) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();

        events.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        Ok(page(events, filter.from, filter.size))
    }

    async fn find_published_events(&self, filter: &PublicEventFilter) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();

        match filter.sort {
            Some(EventSort::EventDate) => events.sort_by(|a, b| b.event_date.cmp(&a.event_date)),
            Some(EventSort::Views) => events.sort_by(|a, b| b.views.cmp(&a.views)),
            None => {}
        }

        Ok(page(events, filter.from, filter.size))
    }

    async fn find_requests_by_event(&self, event_id: i64) -> Result<Vec<ParticipationRequest>> {
        Ok(self
            .tables
            .read()
            .await
            .requests
            .values()
            .filter(|request| request.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn find_requests_by_ids(&self, request_ids: &[i64]) -> Result<Vec<ParticipationRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .requests
            .values()
            .filter(|request| request_ids.contains(&request.id))
            .cloned()
            .collect())
    }

    async fn find_requests_by_requester(&self, requester_id: i64) -> Result<Vec<ParticipationRequest>> {
        Ok(self
            .tables
            .read()
            .await
            .requests
            .values()
            .filter(|request| request.requester_id == requester_id)
            .cloned()
            .collect())
    }

    async fn find_request_by_requester(&self, request_id: i64, requester_id: i64) -> Result<Option<ParticipationRequest>> {
        Ok(self
            .tables
            .read()
            .await
            .requests
            .get(&request_id)
            .filter(|request| request.requester_id == requester_id)
            .cloned())
    }

    async fn insert_request(&self, record: CreateRequestRecord, confirmed_delta: i32) -> Result<ParticipationRequest> {
        let mut tables = self.tables.write().await;

        let duplicate = tables.requests.values().any(|request| {
            request.requester_id == record.requester_id
                && request.event_id == record.event_id
                && request.status != RequestStatus::Canceled
        });
        if duplicate {
            return Err(RendezvousError::conflict("Request already exists"));
        }

        tables.adjust_confirmed(record.event_id, confirmed_delta)?;

        tables.next_request_id += 1;
        let request = ParticipationRequest {
            id: tables.next_request_id,
            event_id: record.event_id,
            requester_id: record.requester_id,
            created: record.created,
            status: record.status,
        };
        tables.requests.insert(request.id, request.clone());

        Ok(request)
    }

    async fn save_requests(&self, event_id: i64, requests: &[ParticipationRequest], confirmed_delta: i32) -> Result<()> {
        let mut tables = self.tables.write().await;

        if let Some(missing) = requests.iter().find(|r| !tables.requests.contains_key(&r.id)) {
            return Err(RendezvousError::request_not_found(missing.id));
        }

        // Counter first: a capacity violation must leave every row untouched
        tables.adjust_confirmed(event_id, confirmed_delta)?;

        for request in requests {
            if let Some(stored) = tables.requests.get_mut(&request.id) {
                stored.status = request.status;
            }
        }

        Ok(())
    }

    async fn count_confirmed_requests(&self, event_id: i64) -> Result<i64> {
        Ok(self
            .tables
            .read()
            .await
            .requests
            .values()
            .filter(|request| request.event_id == event_id && request.status == RequestStatus::Confirmed)
            .count() as i64)
    }

    async fn exists_active_request(&self, requester_id: i64, event_id: i64) -> Result<bool> {
        Ok(self.tables.read().await.requests.values().any(|request| {
            request.requester_id == requester_id
                && request.event_id == event_id
                && request.status != RequestStatus::Canceled
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    fn record(participant_limit: i32) -> CreateEventRecord {
        CreateEventRecord {
            title: "Shag Workshop".to_string(),
            annotation: "Collegiate shag workshop for all levels".to_string(),
            description: "Two hours of shag basics and styling".to_string(),
            category_id: 1,
            initiator_id: 1,
            location: Location { lat: 59.93, lon: 30.33 },
            paid: true,
            participant_limit,
            request_moderation: true,
            created_on: Utc::now(),
            event_date: Utc::now() + Duration::days(7),
        }
    }

    fn pending_request(event_id: i64, requester_id: i64) -> CreateRequestRecord {
        CreateRequestRecord {
            event_id,
            requester_id,
            created: Utc::now(),
            status: RequestStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_insert_event_assigns_ids_and_zero_counters() {
        let store = InMemoryEntityStore::new();
        let first = store.insert_event(record(0)).await.unwrap();
        let second = store.insert_event(record(0)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.state, EventState::Pending);
        assert_eq!(first.confirmed_requests, 0);
        assert_eq!(first.views, 0);
    }

    #[tokio::test]
    async fn test_save_event_preserves_counters() {
        let store = InMemoryEntityStore::new();
        let event = store.insert_event(record(0)).await.unwrap();
        store.increment_views(event.id).await.unwrap();

        let mut edited = event.clone();
        edited.title = "Renamed".to_string();
        edited.views = 99;

        let saved = store.save_event(&edited).await.unwrap();
        assert_eq!(saved.title, "Renamed");
        assert_eq!(saved.views, 1);
    }

    #[tokio::test]
    async fn test_duplicate_active_request_is_rejected() {
        let store = InMemoryEntityStore::new();
        let event = store.insert_event(record(5)).await.unwrap();

        store.insert_request(pending_request(event.id, 7), 0).await.unwrap();
        let second = store.insert_request(pending_request(event.id, 7), 0).await;
        assert_matches!(second, Err(RendezvousError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_save_requests_is_all_or_nothing_on_capacity() {
        let store = InMemoryEntityStore::new();
        let event = store.insert_event(record(1)).await.unwrap();
        let mut a = store.insert_request(pending_request(event.id, 7), 0).await.unwrap();
        let mut b = store.insert_request(pending_request(event.id, 8), 0).await.unwrap();

        a.status = RequestStatus::Confirmed;
        b.status = RequestStatus::Confirmed;
        let result = store.save_requests(event.id, &[a, b], 2).await;
        assert_matches!(result, Err(RendezvousError::Conflict(_)));

        assert_eq!(store.count_confirmed_requests(event.id).await.unwrap(), 0);
        let stored = store.find_event_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(stored.confirmed_requests, 0);
    }

    #[tokio::test]
    async fn test_events_by_initiator_newest_first() {
        let store = InMemoryEntityStore::new();
        for _ in 0..3 {
            store.insert_event(record(0)).await.unwrap();
        }

        let events = store.find_events_by_initiator(1, 0, 2).await.unwrap();
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}
