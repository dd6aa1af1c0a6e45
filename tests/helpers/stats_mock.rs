//! Mock stats service for testing
//!
//! Simulates the hit-counting service with wiremock and exposes the hits it
//! received so tests can assert on reporting.

use serde_json::Value;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};
use Rendezvous::services::{EndpointHit, ViewStats};

pub struct StatsMockServer {
    pub server: MockServer,
}

impl StatsMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Accept every hit with 201 Created
    pub async fn accept_hits(&self) {
        Mock::given(method("POST"))
            .and(path("/hit"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&self.server)
            .await;
    }

    /// Fail every hit with the given status
    pub async fn fail_hits(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/hit"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn serve_stats(&self, stats: Vec<ViewStats>) {
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stats))
            .mount(&self.server)
            .await;
    }

    /// Hits received so far, in arrival order
    pub async fn received_hits(&self) -> Vec<EndpointHit> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == "/hit")
            .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
            .filter_map(|body| serde_json::from_value(body).ok())
            .collect()
    }

    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
