//! Test data builders

use chrono::{Duration, Utc};
use Rendezvous::models::{Category, Location, NewEvent, UpdateEventRequest, User};

pub fn test_user(id: i64) -> User {
    User {
        id,
        name: format!("Member {}", id),
        email: format!("member{}@rendezvous.test", id),
    }
}

pub fn test_category(id: i64, name: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
    }
}

/// Draft scheduled `hours_ahead` from now with default flags
pub fn event_draft(category: i64, hours_ahead: i64) -> NewEvent {
    NewEvent {
        title: "Open-air cinema".to_string(),
        annotation: "Classic films projected on the riverside lawn".to_string(),
        description: "Screenings start at sunset. Chairs available.".to_string(),
        category,
        event_date: Utc::now() + Duration::hours(hours_ahead),
        location: Location { lat: 52.52, lon: 13.40 },
        paid: None,
        participant_limit: None,
        request_moderation: None,
    }
}

pub fn limited_draft(category: i64, limit: i32, moderation: bool) -> NewEvent {
    NewEvent {
        participant_limit: Some(limit),
        request_moderation: Some(moderation),
        ..event_draft(category, 48)
    }
}

pub fn state_action(action: &str) -> UpdateEventRequest {
    UpdateEventRequest {
        state_action: Some(action.to_string()),
        ..Default::default()
    }
}
