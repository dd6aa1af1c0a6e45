//! Participation request model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Confirmed,
    Rejected,
    Canceled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Confirmed => "CONFIRMED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RequestStatus::Pending),
            "CONFIRMED" => Ok(RequestStatus::Confirmed),
            "REJECTED" => Ok(RequestStatus::Rejected),
            "CANCELED" => Ok(RequestStatus::Canceled),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationRequest {
    pub id: i64,
    pub event_id: i64,
    pub requester_id: i64,
    pub created: DateTime<Utc>,
    pub status: RequestStatus,
}

/// Request about to be inserted by the store
#[derive(Debug, Clone)]
pub struct CreateRequestRecord {
    pub event_id: i64,
    pub requester_id: i64,
    pub created: DateTime<Utc>,
    pub status: RequestStatus,
}

/// Organizer's moderation batch. `status` stays a raw keyword so that an
/// unsupported value surfaces as a validation failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRequestStatusUpdateRequest {
    pub request_ids: Vec<i64>,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequestStatusUpdateResult {
    pub confirmed_requests: Vec<ParticipationRequest>,
    pub rejected_requests: Vec<ParticipationRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_keywords_are_exact() {
        assert_eq!("CONFIRMED".parse::<RequestStatus>(), Ok(RequestStatus::Confirmed));
        assert!("confirmed".parse::<RequestStatus>().is_err());
        assert_eq!(RequestStatus::Canceled.to_string(), "CANCELED");
    }

    #[test]
    fn test_status_serializes_upper_case() {
        let json = serde_json::to_string(&RequestStatus::Rejected).unwrap();
        assert_eq!(json, "\"REJECTED\"");
    }
}
