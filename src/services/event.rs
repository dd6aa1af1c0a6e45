//! Event lifecycle service
//!
//! Creation and editing by organizers, moderation by administrators, and the
//! public read paths with view counting and hit reporting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::database::EntityStore;
use crate::models::event::{
    AdminEventFilter, AdminStateAction, CreateEventRecord, Event, EventState, NewEvent, OwnerStateAction,
    PublicEventFilter, UpdateEventRequest,
};
use crate::services::locks::EventLocks;
use crate::services::stats::{report_hit, EndpointHit, StatsReporter};
use crate::services::views::ViewTracker;
use crate::utils::errors::{RendezvousError, Result};
use crate::utils::helpers::{page_bounds, satisfies_lead_time};
use crate::utils::logging::{log_admin_action, log_event_action};

/// Uri reported for the public event list
pub const PUBLIC_EVENTS_URI: &str = "/events";

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EntityStore>,
    locks: EventLocks,
    views: Arc<dyn ViewTracker>,
    stats: Arc<dyn StatsReporter>,
    settings: Settings,
}

impl EventService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        locks: EventLocks,
        views: Arc<dyn ViewTracker>,
        stats: Arc<dyn StatsReporter>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            locks,
            views,
            stats,
            settings,
        }
    }

    /// Create a new event in PENDING state
    pub async fn create_event(&self, initiator_id: i64, draft: NewEvent) -> Result<Event> {
        debug!(initiator_id = initiator_id, title = %draft.title, "Creating event");

        let lead_hours = self.settings.events.owner_lead_time_hours;
        ensure_lead_time(draft.event_date, lead_hours)?;

        self.store
            .find_user(initiator_id)
            .await?
            .ok_or_else(|| RendezvousError::user_not_found(initiator_id))?;
        self.store
            .find_category(draft.category)
            .await?
            .ok_or_else(|| RendezvousError::category_not_found(draft.category))?;

        let participant_limit = draft.participant_limit.unwrap_or(0);
        ensure_limit_not_negative(participant_limit)?;

        let event = self
            .store
            .insert_event(CreateEventRecord {
                title: draft.title,
                annotation: draft.annotation,
                description: draft.description,
                category_id: draft.category,
                initiator_id,
                location: draft.location,
                paid: draft.paid.unwrap_or(false),
                participant_limit,
                request_moderation: draft.request_moderation.unwrap_or(true),
                created_on: Utc::now(),
                event_date: draft.event_date,
            })
            .await?;

        log_event_action(event.id, "create", initiator_id, Some(&event.title));
        Ok(event)
    }

    /// Page through an organizer's own events, newest first
    pub async fn get_owner_events(&self, owner_id: i64, from: i64, size: i64) -> Result<Vec<Event>> {
        self.store
            .find_user(owner_id)
            .await?
            .ok_or_else(|| RendezvousError::user_not_found(owner_id))?;

        if size <= 0 {
            return Err(RendezvousError::validation("Page size must be positive"));
        }

        let (offset, limit) = page_bounds(from, size);
        self.store.find_events_by_initiator(owner_id, offset, limit).await
    }

    pub async fn get_owner_event(&self, owner_id: i64, event_id: i64) -> Result<Event> {
        self.store
            .find_event_by_owner(event_id, owner_id)
            .await?
            .ok_or_else(|| RendezvousError::event_not_found(event_id))
    }

    /// Organizer edit. Published events are frozen; the state action may
    /// send the event to review or withdraw it.
    pub async fn update_by_owner(&self, owner_id: i64, event_id: i64, update: UpdateEventRequest) -> Result<Event> {
        let _guard = self.locks.lock(event_id).await;
        let mut event = self.get_owner_event(owner_id, event_id).await?;

        if event.state == EventState::Published {
            return Err(RendezvousError::conflict("Only pending or canceled events can be changed"));
        }

        self.validate_update(&update, self.settings.events.owner_lead_time_hours)
            .await?;

        event.apply_update(&update);
        match update.state_action.as_deref().and_then(OwnerStateAction::parse) {
            Some(OwnerStateAction::SendToReview) => event.state = EventState::Pending,
            Some(OwnerStateAction::CancelReview) => event.state = EventState::Canceled,
            None => {}
        }

        let saved = self.persist(&event, update.participant_limit.is_some()).await?;
        log_event_action(saved.id, "update", owner_id, Some(saved.state.as_str()));
        Ok(saved)
    }

    /// Administrator edit; publishing and rejection only apply to PENDING events
    pub async fn update_by_admin(&self, event_id: i64, update: UpdateEventRequest) -> Result<Event> {
        let _guard = self.locks.lock(event_id).await;
        let mut event = self
            .store
            .find_event_by_id(event_id)
            .await?
            .ok_or_else(|| RendezvousError::event_not_found(event_id))?;

        self.validate_update(&update, self.settings.events.admin_lead_time_hours)
            .await?;

        let action = update.state_action.as_deref().and_then(AdminStateAction::parse);
        if action.is_some() && event.state != EventState::Pending {
            warn!(event_id = event_id, state = %event.state, "State action refused");
            return Err(RendezvousError::conflict(format!(
                "Cannot publish the event because it's not in the right state: {}",
                event.state
            )));
        }

        event.apply_update(&update);
        match action {
            Some(AdminStateAction::PublishEvent) => {
                event.state = EventState::Published;
                event.published_on = Some(Utc::now());
            }
            Some(AdminStateAction::RejectEvent) => event.state = EventState::Canceled,
            None => {}
        }

        let saved = self.persist(&event, update.participant_limit.is_some()).await?;
        log_admin_action("update_event", Some(&event_id.to_string()), Some(saved.state.as_str()));
        Ok(saved)
    }

    /// Administrator search over all events
    pub async fn search_events(&self, mut filter: AdminEventFilter) -> Result<Vec<Event>> {
        if filter.size <= 0 {
            return Err(RendezvousError::validation("Page size must be positive"));
        }
        ensure_range(filter.range_start, filter.range_end)?;
        (filter.from, filter.size) = page_bounds(filter.from, filter.size);

        self.store.search_events(&filter).await
    }

    /// Public search over published events.
    ///
    /// Returned events carry the stored confirmed counter; only the single
    /// event read recounts.
    pub async fn search_published_events(&self, mut filter: PublicEventFilter, viewer_address: &str) -> Result<Vec<Event>> {
        if filter.size <= 0 {
            return Err(RendezvousError::validation("Page size must be positive"));
        }
        ensure_range(filter.range_start, filter.range_end)?;
        (filter.from, filter.size) = page_bounds(filter.from, filter.size);

        if filter.range_start.is_none() && filter.range_end.is_none() {
            filter.range_start = Some(Utc::now());
        }

        let events = self.store.find_published_events(&filter).await?;
        self.report(PUBLIC_EVENTS_URI.to_string(), viewer_address).await;

        debug!(found = events.len(), "Public event search");
        Ok(events)
    }

    /// Public read of one published event; counts the view once per address
    pub async fn get_published_event(&self, event_id: i64, viewer_address: &str) -> Result<Event> {
        let event = self
            .store
            .find_event_by_id(event_id)
            .await?
            .filter(|event| event.state == EventState::Published)
            .ok_or_else(|| RendezvousError::event_not_found(event_id))?;

        if self.views.record_view(event.id, viewer_address).await {
            self.store.increment_views(event.id).await?;
        }

        self.report(format!("{}/{}", PUBLIC_EVENTS_URI, event.id), viewer_address)
            .await;

        let mut event = self
            .store
            .find_event_by_id(event_id)
            .await?
            .ok_or_else(|| RendezvousError::event_not_found(event_id))?;
        let confirmed = self.store.count_confirmed_requests(event_id).await?;
        event.confirmed_requests = i32::try_from(confirmed).unwrap_or(i32::MAX);

        Ok(event)
    }

    async fn report(&self, uri: String, viewer_address: &str) {
        let hit = EndpointHit::new(self.settings.stats.app_name.clone(), uri, viewer_address);
        report_hit(self.stats.as_ref(), hit).await;
    }

    async fn validate_update(&self, update: &UpdateEventRequest, lead_hours: i64) -> Result<()> {
        if let Some(event_date) = update.event_date {
            ensure_lead_time(event_date, lead_hours)?;
        }
        if let Some(limit) = update.participant_limit {
            ensure_limit_not_negative(limit)?;
        }
        if let Some(category_id) = update.category {
            self.store
                .find_category(category_id)
                .await?
                .ok_or_else(|| RendezvousError::category_not_found(category_id))?;
        }
        Ok(())
    }

    /// Save an edited event. Callers hold the event lock from the read
    /// onwards, so a changed limit is checked against a settled confirmed count.
    async fn persist(&self, event: &Event, limit_changed: bool) -> Result<Event> {
        if !limit_changed {
            return self.store.save_event(event).await;
        }

        let confirmed = self.store.count_confirmed_requests(event.id).await?;
        if !event.is_unlimited() && confirmed > i64::from(event.participant_limit) {
            warn!(event_id = event.id, confirmed = confirmed, "Participant limit below confirmed count refused");
            return Err(RendezvousError::conflict(format!(
                "Participant limit cannot be lower than the {} confirmed participants",
                confirmed
            )));
        }

        let saved = self.store.save_event(event).await?;
        info!(event_id = saved.id, participant_limit = saved.participant_limit, "Participant limit changed");
        Ok(saved)
    }
}

fn ensure_lead_time(event_date: DateTime<Utc>, lead_hours: i64) -> Result<()> {
    if satisfies_lead_time(event_date, Utc::now(), lead_hours) {
        Ok(())
    } else {
        Err(RendezvousError::validation(format!(
            "Event date must be at least {} hours after current time",
            lead_hours
        )))
    }
}

fn ensure_limit_not_negative(limit: i32) -> Result<()> {
    if limit < 0 {
        return Err(RendezvousError::validation("Participant limit cannot be negative"));
    }
    Ok(())
}

fn ensure_range(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            Err(RendezvousError::validation("Range start must not be after range end"))
        }
        _ => Ok(()),
    }
}

/// Parse administrator state filters; any unknown name fails the whole query
pub fn parse_event_states(raw: &[String]) -> Result<Vec<EventState>> {
    raw.iter()
        .map(|state| {
            state
                .parse::<EventState>()
                .map_err(|_| RendezvousError::validation(format!("Unknown event state: {}", state)))
        })
        .collect()
}
