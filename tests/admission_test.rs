//! Participation admission tests
//!
//! End-to-end admission flows through the service factory, including
//! concurrent callers racing for the last slots of an event.

mod helpers;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use helpers::*;
use serial_test::serial;
use Rendezvous::models::RequestStatus;
use Rendezvous::RendezvousError;

#[tokio::test]
#[serial]
async fn test_moderated_batch_confirms_in_order_until_full() {
    let ctx = TestContext::new(3).await;
    let event = ctx.published_event(2, true).await;

    let mut ids = Vec::new();
    for requester in 2..=4 {
        let request = ctx.participation().add_request(requester, event.id).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        ids.push(request.id);
    }

    let result = ctx
        .participation()
        .update_status(ORGANIZER_ID, event.id, status_update(&ids, "CONFIRMED"))
        .await
        .unwrap();

    let confirmed: Vec<i64> = result.confirmed_requests.iter().map(|r| r.id).collect();
    let rejected: Vec<i64> = result.rejected_requests.iter().map(|r| r.id).collect();
    assert_eq!(confirmed, ids[..2].to_vec());
    assert_eq!(rejected, ids[2..].to_vec());
    assert_eq!(ctx.stored_event(event.id).await.confirmed_requests, 2);

    let statuses: Vec<RequestStatus> = ctx
        .participation()
        .list_participants(ORGANIZER_ID, event.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.status)
        .collect();
    assert!(!statuses.contains(&RequestStatus::Pending));
}

#[tokio::test]
#[serial]
async fn test_unlimited_event_confirms_immediately_and_refuses_moderation() {
    let ctx = TestContext::new(4).await;
    let event = ctx.published_event(0, true).await;

    let mut ids = Vec::new();
    for requester in 2..=5 {
        let request = ctx.participation().add_request(requester, event.id).await.unwrap();
        assert_eq!(request.status, RequestStatus::Confirmed);
        ids.push(request.id);
    }

    assert_matches!(
        ctx.participation()
            .update_status(ORGANIZER_ID, event.id, status_update(&ids, "REJECTED"))
            .await,
        Err(RendezvousError::Conflict(_))
    );
    assert_eq!(ctx.stored_event(event.id).await.confirmed_requests, 4);
}

#[tokio::test]
#[serial]
async fn test_second_request_for_same_event_conflicts() {
    let ctx = TestContext::new(1).await;
    let event = ctx.published_event(10, true).await;

    ctx.participation().add_request(2, event.id).await.unwrap();
    assert_matches!(
        ctx.participation().add_request(2, event.id).await,
        Err(RendezvousError::Conflict(msg)) if msg == "Request already exists"
    );
}

#[tokio::test]
#[serial]
async fn test_cancel_adjusts_counter_and_is_idempotent() {
    let ctx = TestContext::new(2).await;
    let open = ctx.published_event(5, false).await;
    let moderated = ctx.published_event(5, true).await;

    let confirmed = ctx.participation().add_request(2, open.id).await.unwrap();
    let pending = ctx.participation().add_request(2, moderated.id).await.unwrap();
    assert_eq!(ctx.stored_event(open.id).await.confirmed_requests, 1);

    ctx.participation().cancel_request(2, confirmed.id).await.unwrap();
    assert_eq!(ctx.stored_event(open.id).await.confirmed_requests, 0);

    let again = ctx.participation().cancel_request(2, confirmed.id).await.unwrap();
    assert_eq!(again.status, RequestStatus::Canceled);
    assert_eq!(ctx.stored_event(open.id).await.confirmed_requests, 0);

    ctx.participation().cancel_request(2, pending.id).await.unwrap();
    assert_eq!(ctx.stored_event(moderated.id).await.confirmed_requests, 0);

    assert_matches!(
        ctx.participation().cancel_request(3, pending.id).await,
        Err(RendezvousError::NotFound(_))
    );
}

#[tokio::test]
#[serial]
async fn test_user_request_listing() {
    let ctx = TestContext::new(2).await;
    let first = ctx.published_event(0, false).await;
    let second = ctx.published_event(3, true).await;

    ctx.participation().add_request(2, first.id).await.unwrap();
    ctx.participation().add_request(2, second.id).await.unwrap();

    let mine = ctx.participation().list_user_requests(2).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|r| r.requester_id == 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[serial]
async fn test_racing_joins_and_confirmations_never_exceed_limit() {
    const LIMIT: i32 = 5;
    let ctx = Arc::new(TestContext::new(60).await);
    let event = ctx.published_event(LIMIT, true).await;

    let mut pending = Vec::new();
    for requester in 2..=31 {
        pending.push(ctx.participation().add_request(requester, event.id).await.unwrap().id);
    }

    let running = Arc::new(AtomicBool::new(true));
    let sampler = {
        let ctx = ctx.clone();
        let running = running.clone();
        tokio::spawn(async move {
            let mut max_seen = 0;
            while running.load(Ordering::SeqCst) {
                max_seen = max_seen.max(ctx.stored_event(event.id).await.confirmed_requests);
                tokio::task::yield_now().await;
            }
            max_seen
        })
    };

    let mut tasks = Vec::new();
    for batch in pending.chunks(3) {
        let ctx = ctx.clone();
        let batch = batch.to_vec();
        tasks.push(tokio::spawn(async move {
            let _ = ctx
                .participation()
                .update_status(ORGANIZER_ID, event.id, status_update(&batch, "CONFIRMED"))
                .await;
        }));
    }
    for requester in 32..=61 {
        let ctx = ctx.clone();
        tasks.push(tokio::spawn(async move {
            let _ = ctx.participation().add_request(requester, event.id).await;
        }));
    }

    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }
    running.store(false, Ordering::SeqCst);
    let max_seen = sampler.await.unwrap();

    assert!(max_seen <= LIMIT);
    assert_eq!(ctx.confirmed_count(event.id).await, i64::from(LIMIT));
    assert_eq!(ctx.stored_event(event.id).await.confirmed_requests, LIMIT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[serial]
async fn test_racing_joins_and_cancellations_keep_counter_exact() {
    const LIMIT: i32 = 4;
    let ctx = Arc::new(TestContext::new(40).await);
    let event = ctx.published_event(LIMIT, false).await;

    let tasks: Vec<_> = (2..=41)
        .map(|requester| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                if let Ok(request) = ctx.participation().add_request(requester, event.id).await {
                    if requester % 2 == 0 {
                        ctx.participation().cancel_request(requester, request.id).await.unwrap();
                    }
                }
            })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }

    let counter = ctx.stored_event(event.id).await.confirmed_requests;
    assert!(counter <= LIMIT);
    assert_eq!(i64::from(counter), ctx.confirmed_count(event.id).await);
}
