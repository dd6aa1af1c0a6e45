//! Participation admission
//!
//! Join requests, cancellations and organizer moderation. Every operation
//! that can move an event's confirmed counter runs under that event's lock,
//! and the counter change is written together with the request rows.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::database::EntityStore;
use crate::models::event::EventState;
use crate::models::request::{
    CreateRequestRecord, EventRequestStatusUpdateRequest, EventRequestStatusUpdateResult, ParticipationRequest,
    RequestStatus,
};
use crate::services::locks::EventLocks;
use crate::utils::errors::{RendezvousError, Result};
use crate::utils::logging::{log_admission_decision, log_event_action};

#[derive(Clone)]
pub struct ParticipationService {
    store: Arc<dyn EntityStore>,
    locks: EventLocks,
}

impl ParticipationService {
    pub fn new(store: Arc<dyn EntityStore>, locks: EventLocks) -> Self {
        Self { store, locks }
    }

    /// Submit a request to join a published event
    pub async fn add_request(&self, requester_id: i64, event_id: i64) -> Result<ParticipationRequest> {
        debug!(requester_id = requester_id, event_id = event_id, "Adding participation request");
        let _guard = self.locks.lock(event_id).await;

        if self.store.exists_active_request(requester_id, event_id).await? {
            return Err(RendezvousError::conflict("Request already exists"));
        }

        self.store
            .find_user(requester_id)
            .await?
            .ok_or_else(|| RendezvousError::user_not_found(requester_id))?;
        let event = self
            .store
            .find_event_by_id(event_id)
            .await?
            .ok_or_else(|| RendezvousError::event_not_found(event_id))?;

        if event.initiator_id == requester_id {
            return Err(RendezvousError::conflict("Initiator cannot add request to own event"));
        }
        if event.state != EventState::Published {
            return Err(RendezvousError::conflict("Cannot participate in unpublished event"));
        }
        if event.participant_limit < 0 {
            return Err(RendezvousError::validation("Participant limit cannot be negative"));
        }

        let confirmed = self.store.count_confirmed_requests(event_id).await?;
        if !event.has_free_slots(confirmed) {
            warn!(event_id = event_id, requester_id = requester_id, "Join refused, event is full");
            return Err(RendezvousError::conflict("Participant limit reached"));
        }

        let status = if event.needs_moderation() {
            RequestStatus::Pending
        } else {
            RequestStatus::Confirmed
        };
        let delta = i32::from(status == RequestStatus::Confirmed);

        let request = self
            .store
            .insert_request(
                CreateRequestRecord {
                    event_id,
                    requester_id,
                    created: Utc::now(),
                    status,
                },
                delta,
            )
            .await?;

        log_event_action(event_id, "join_request", requester_id, Some(request.status.as_str()));
        Ok(request)
    }

    /// Withdraw one of the requester's own requests
    pub async fn cancel_request(&self, requester_id: i64, request_id: i64) -> Result<ParticipationRequest> {
        let event_id = self.find_own_request(requester_id, request_id).await?.event_id;

        let _guard = self.locks.lock(event_id).await;
        let mut request = self.find_own_request(requester_id, request_id).await?;

        let delta = if request.status == RequestStatus::Confirmed { -1 } else { 0 };
        request.status = RequestStatus::Canceled;

        self.store
            .save_requests(event_id, std::slice::from_ref(&request), delta)
            .await?;

        log_event_action(event_id, "cancel_request", requester_id, Some(&request_id.to_string()));
        Ok(request)
    }

    /// All requests submitted to an organizer's event
    pub async fn list_participants(&self, owner_id: i64, event_id: i64) -> Result<Vec<ParticipationRequest>> {
        self.store
            .find_event_by_owner(event_id, owner_id)
            .await?
            .ok_or_else(|| RendezvousError::event_not_found(event_id))?;

        self.store.find_requests_by_event(event_id).await
    }

    /// All requests a user has submitted
    pub async fn list_user_requests(&self, user_id: i64) -> Result<Vec<ParticipationRequest>> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| RendezvousError::user_not_found(user_id))?;

        self.store.find_requests_by_requester(user_id).await
    }

    /// Organizer moderation of pending requests.
    ///
    /// Confirmation admits requests in the order given until the event is
    /// full; the remainder of the batch is rejected. Ids that do not resolve
    /// to a request of this event are ignored.
    pub async fn update_status(
        &self,
        owner_id: i64,
        event_id: i64,
        update: EventRequestStatusUpdateRequest,
    ) -> Result<EventRequestStatusUpdateResult> {
        let _guard = self.locks.lock(event_id).await;

        let event = self
            .store
            .find_event_by_owner(event_id, owner_id)
            .await?
            .ok_or_else(|| RendezvousError::event_not_found(event_id))?;

        if !event.needs_moderation() {
            return Err(RendezvousError::conflict("Event does not require request moderation"));
        }

        let mut seen = HashSet::new();
        let ids: Vec<i64> = update.request_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut found = self.store.find_requests_by_ids(&ids).await?;
        found.retain(|request| request.event_id == event_id);
        let requests: Vec<ParticipationRequest> = ids
            .iter()
            .filter_map(|id| found.iter().find(|request| request.id == *id).cloned())
            .collect();

        if requests.is_empty() {
            return Err(RendezvousError::not_found("No requests found with provided IDs"));
        }
        if requests.iter().any(|request| request.status != RequestStatus::Pending) {
            return Err(RendezvousError::conflict("Request must have status PENDING"));
        }

        let target = update
            .status
            .parse::<RequestStatus>()
            .ok()
            .filter(|status| matches!(status, RequestStatus::Confirmed | RequestStatus::Rejected))
            .ok_or_else(|| RendezvousError::validation(format!("Invalid status: {}", update.status)))?;

        let mut result = EventRequestStatusUpdateResult::default();
        let mut confirmed_delta = 0;

        match target {
            RequestStatus::Confirmed => {
                let confirmed = self.store.count_confirmed_requests(event_id).await?;
                let available = i64::from(event.participant_limit) - confirmed;
                if available <= 0 {
                    warn!(event_id = event_id, owner_id = owner_id, "Confirmation refused, event is full");
                    return Err(RendezvousError::conflict("Participant limit reached"));
                }

                for (position, mut request) in requests.into_iter().enumerate() {
                    if (position as i64) < available {
                        request.status = RequestStatus::Confirmed;
                        confirmed_delta += 1;
                        result.confirmed_requests.push(request);
                    } else {
                        request.status = RequestStatus::Rejected;
                        result.rejected_requests.push(request);
                    }
                }
            }
            _ => {
                result.rejected_requests = requests
                    .into_iter()
                    .map(|mut request| {
                        request.status = RequestStatus::Rejected;
                        request
                    })
                    .collect();
            }
        }

        let changed: Vec<ParticipationRequest> = result
            .confirmed_requests
            .iter()
            .chain(result.rejected_requests.iter())
            .cloned()
            .collect();
        self.store.save_requests(event_id, &changed, confirmed_delta).await?;

        let confirmed_total = self.store.count_confirmed_requests(event_id).await?;
        log_admission_decision(
            event_id,
            owner_id,
            result.confirmed_requests.len(),
            result.rejected_requests.len(),
            confirmed_total,
        );
        debug!(event_id = event_id, status = %target, "Request statuses updated");

        Ok(result)
    }

    async fn find_own_request(&self, requester_id: i64, request_id: i64) -> Result<ParticipationRequest> {
        self.store
            .find_request_by_requester(request_id, requester_id)
            .await?
            .ok_or_else(|| {
                info!(request_id = request_id, requester_id = requester_id, "Request not owned by caller");
                RendezvousError::request_not_found(request_id)
            })
    }
}
