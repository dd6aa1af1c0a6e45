//! Event model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Publication state of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    Pending,
    Published,
    Canceled,
}

impl EventState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventState::Pending => "PENDING",
            EventState::Published => "PUBLISHED",
            EventState::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventState {
    type Err = String;

    /// Case-insensitive: admin search accepts `published` as well as `PUBLISHED`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(EventState::Pending),
            "PUBLISHED" => Ok(EventState::Published),
            "CANCELED" => Ok(EventState::Canceled),
            _ => Err(format!("Invalid state value: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category_id: i64,
    pub initiator_id: i64,
    pub location: Location,
    pub paid: bool,
    /// 0 means unlimited
    pub participant_limit: i32,
    pub request_moderation: bool,
    pub created_on: DateTime<Utc>,
    pub published_on: Option<DateTime<Utc>>,
    pub event_date: DateTime<Utc>,
    pub confirmed_requests: i32,
    pub views: i64,
    pub state: EventState,
}

impl Event {
    pub fn is_unlimited(&self) -> bool {
        self.participant_limit == 0
    }

    /// Whether joining requests go through the organizer
    pub fn needs_moderation(&self) -> bool {
        self.request_moderation && !self.is_unlimited()
    }

    /// True when another confirmed participant fits
    pub fn has_free_slots(&self, confirmed: i64) -> bool {
        self.is_unlimited() || confirmed < i64::from(self.participant_limit)
    }

    /// Apply every present field of `update`; absent fields stay unchanged.
    ///
    /// State actions are interpreted by the caller since their meaning depends
    /// on who is editing.
    pub fn apply_update(&mut self, update: &UpdateEventRequest) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut self.title, &update.title);
        set(&mut self.annotation, &update.annotation);
        set(&mut self.description, &update.description);
        set(&mut self.category_id, &update.category);
        set(&mut self.event_date, &update.event_date);
        set(&mut self.location, &update.location);
        set(&mut self.paid, &update.paid);
        set(&mut self.participant_limit, &update.participant_limit);
        set(&mut self.request_moderation, &update.request_moderation);
    }
}

/// Draft submitted by an organizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category: i64,
    pub event_date: DateTime<Utc>,
    pub location: Location,
    pub paid: Option<bool>,
    pub participant_limit: Option<i32>,
    pub request_moderation: Option<bool>,
}

/// Fully resolved event ready to be inserted by the store
#[derive(Debug, Clone)]
pub struct CreateEventRecord {
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category_id: i64,
    pub initiator_id: i64,
    pub location: Location,
    pub paid: bool,
    pub participant_limit: i32,
    pub request_moderation: bool,
    pub created_on: DateTime<Utc>,
    pub event_date: DateTime<Utc>,
}

/// Partial update; `None` always means "leave unchanged"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub annotation: Option<String>,
    pub description: Option<String>,
    pub category: Option<i64>,
    pub event_date: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub paid: Option<bool>,
    pub participant_limit: Option<i32>,
    pub request_moderation: Option<bool>,
    pub state_action: Option<String>,
}

/// State actions available to the event's organizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerStateAction {
    SendToReview,
    CancelReview,
}

impl OwnerStateAction {
    /// Unknown keywords yield `None` and leave the state untouched
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SEND_TO_REVIEW" => Some(OwnerStateAction::SendToReview),
            "CANCEL_REVIEW" => Some(OwnerStateAction::CancelReview),
            _ => None,
        }
    }
}

/// State actions available to administrators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStateAction {
    PublishEvent,
    RejectEvent,
}

impl AdminStateAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PUBLISH_EVENT" => Some(AdminStateAction::PublishEvent),
            "REJECT_EVENT" => Some(AdminStateAction::RejectEvent),
            _ => None,
        }
    }
}

/// Administrator search; every `None` criterion matches everything
#[derive(Debug, Clone, Default)]
pub struct AdminEventFilter {
    pub users: Option<Vec<i64>>,
    pub states: Option<Vec<EventState>>,
    pub categories: Option<Vec<i64>>,
    pub range_start: Option<DateTime<Utc>>,
    pub range_end: Option<DateTime<Utc>>,
    pub from: i64,
    pub size: i64,
}

impl AdminEventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.users.as_ref().map_or(true, |ids| ids.contains(&event.initiator_id))
            && self.states.as_ref().map_or(true, |states| states.contains(&event.state))
            && self.categories.as_ref().map_or(true, |ids| ids.contains(&event.category_id))
            && self.range_start.map_or(true, |start| event.event_date >= start)
            && self.range_end.map_or(true, |end| event.event_date <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSort {
    EventDate,
    Views,
}

impl EventSort {
    /// Unknown sort keys mean "unsorted"
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "EVENT_DATE" => Some(EventSort::EventDate),
            "VIEWS" => Some(EventSort::Views),
            _ => None,
        }
    }
}

/// Public search over published events
#[derive(Debug, Clone, Default)]
pub struct PublicEventFilter {
    pub text: Option<String>,
    pub categories: Option<Vec<i64>>,
    pub paid: Option<bool>,
    pub range_start: Option<DateTime<Utc>>,
    pub range_end: Option<DateTime<Utc>>,
    pub only_available: bool,
    pub sort: Option<EventSort>,
    pub from: i64,
    pub size: i64,
}

impl PublicEventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        let text_matches = match self.text.as_deref() {
            Some(text) if !text.is_empty() => {
                crate::utils::helpers::contains_ignore_case(&event.annotation, text)
                    || crate::utils::helpers::contains_ignore_case(&event.description, text)
            }
            _ => true,
        };

        event.state == EventState::Published
            && text_matches
            && self.categories.as_ref().map_or(true, |ids| ids.is_empty() || ids.contains(&event.category_id))
            && self.paid.map_or(true, |paid| event.paid == paid)
            && self.range_start.map_or(true, |start| event.event_date >= start)
            && self.range_end.map_or(true, |end| event.event_date <= end)
            && (!self.only_available || event.has_free_slots(i64::from(event.confirmed_requests)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event() -> Event {
        let now = Utc::now();
        Event {
            id: 1,
            title: "Lindy Social".to_string(),
            annotation: "Monthly lindy hop social dance".to_string(),
            description: "Live band, beginner lesson at 19:00".to_string(),
            category_id: 3,
            initiator_id: 10,
            location: Location { lat: 55.75, lon: 37.61 },
            paid: false,
            participant_limit: 2,
            request_moderation: true,
            created_on: now,
            published_on: None,
            event_date: now + Duration::days(3),
            confirmed_requests: 0,
            views: 0,
            state: EventState::Pending,
        }
    }

    #[test]
    fn test_apply_update_keeps_absent_fields() {
        let mut event = sample_event();
        let original = event.clone();

        event.apply_update(&UpdateEventRequest {
            title: Some("Balboa Social".to_string()),
            paid: Some(true),
            ..Default::default()
        });

        assert_eq!(event.title, "Balboa Social");
        assert!(event.paid);
        assert_eq!(event.annotation, original.annotation);
        assert_eq!(event.participant_limit, original.participant_limit);
        assert_eq!(event.state, original.state);
    }

    #[test]
    fn test_moderation_rules() {
        let mut event = sample_event();
        assert!(event.needs_moderation());
        assert!(event.has_free_slots(1));
        assert!(!event.has_free_slots(2));

        event.participant_limit = 0;
        assert!(!event.needs_moderation());
        assert!(event.has_free_slots(1_000));
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!("published".parse::<EventState>(), Ok(EventState::Published));
        assert!("DRAFT".parse::<EventState>().is_err());
        assert_eq!(OwnerStateAction::parse("SEND_TO_REVIEW"), Some(OwnerStateAction::SendToReview));
        assert_eq!(OwnerStateAction::parse("PUBLISH_EVENT"), None);
        assert_eq!(AdminStateAction::parse("REJECT_EVENT"), Some(AdminStateAction::RejectEvent));
    }

    #[test]
    fn test_public_filter_text_and_availability() {
        let mut event = sample_event();
        event.state = EventState::Published;
        event.confirmed_requests = 2;

        let filter = PublicEventFilter { text: Some("LINDY".to_string()), ..Default::default() };
        assert!(filter.matches(&event));

        let filter = PublicEventFilter { only_available: true, ..Default::default() };
        assert!(!filter.matches(&event));

        event.state = EventState::Pending;
        assert!(!PublicEventFilter::default().matches(&event));
    }
}
