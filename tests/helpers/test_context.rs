//! Test context for unified test setup
//!
//! Wires the real services over a seeded in-memory store, with hit reporting
//! pointed at a mock stats server.

use std::sync::Arc;

use Rendezvous::config::Settings;
use Rendezvous::database::{EntityStore, InMemoryEntityStore};
use Rendezvous::models::{Event, EventRequestStatusUpdateRequest};
use Rendezvous::services::{EventService, ParticipationService, ServiceFactory};

use super::stats_mock::StatsMockServer;
use super::test_data::{limited_draft, state_action, test_category, test_user};

pub const ORGANIZER_ID: i64 = 1;
pub const CATEGORY_ID: i64 = 1;

pub struct TestContext {
    pub store: Arc<InMemoryEntityStore>,
    pub services: ServiceFactory,
    pub stats_mock: StatsMockServer,
    pub settings: Settings,
}

impl TestContext {
    /// Context with the organizer and `members` further users seeded
    pub async fn new(members: i64) -> Self {
        let _ = tracing_subscriber::fmt::try_init();

        let stats_mock = StatsMockServer::new().await;
        stats_mock.accept_hits().await;

        let mut settings = Settings::default();
        settings.stats.url = stats_mock.url();
        settings.stats.enabled = true;

        let store = Arc::new(InMemoryEntityStore::new());
        for id in 1..=members + 1 {
            store.add_user(test_user(id)).await;
        }
        store.add_category(test_category(CATEGORY_ID, "Festivals")).await;

        let services = ServiceFactory::new(settings.clone(), store.clone())
            .await
            .expect("Failed to build services");

        Self {
            store,
            services,
            stats_mock,
            settings,
        }
    }

    pub fn events(&self) -> &EventService {
        &self.services.event_service
    }

    pub fn participation(&self) -> &ParticipationService {
        &self.services.participation_service
    }

    /// Create an event as the organizer and publish it
    pub async fn published_event(&self, limit: i32, moderation: bool) -> Event {
        let event = self
            .events()
            .create_event(ORGANIZER_ID, limited_draft(CATEGORY_ID, limit, moderation))
            .await
            .expect("Failed to create event");

        self.events()
            .update_by_admin(event.id, state_action("PUBLISH_EVENT"))
            .await
            .expect("Failed to publish event")
    }

    pub async fn stored_event(&self, event_id: i64) -> Event {
        self.store
            .find_event_by_id(event_id)
            .await
            .expect("Store failure")
            .expect("Event missing")
    }

    pub async fn confirmed_count(&self, event_id: i64) -> i64 {
        self.store
            .count_confirmed_requests(event_id)
            .await
            .expect("Store failure")
    }
}

pub fn status_update(ids: &[i64], status: &str) -> EventRequestStatusUpdateRequest {
    EventRequestStatusUpdateRequest {
        request_ids: ids.to_vec(),
        status: status.to_string(),
    }
}
