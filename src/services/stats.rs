//! Statistics service client
//!
//! Public reads are reported to an external hit-counting service. Reporting
//! is best effort: a failed hit never fails the read that triggered it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::StatsConfig;
use crate::utils::errors::{RendezvousError, Result};
use crate::utils::helpers::format_timestamp;
use crate::utils::logging::log_api_error;

/// One recorded read of a public endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointHit {
    pub app: String,
    pub uri: String,
    pub ip: String,
    #[serde(with = "hit_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl EndpointHit {
    pub fn new(app: impl Into<String>, uri: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            uri: uri.into(),
            ip: ip.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Aggregated hit count for one uri
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewStats {
    pub app: String,
    pub uri: String,
    pub hits: i64,
}

mod hit_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::utils::helpers::{format_timestamp, parse_timestamp};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}

#[async_trait]
pub trait StatsReporter: Send + Sync {
    async fn record_hit(&self, hit: &EndpointHit) -> Result<()>;

    async fn get_stats(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        uris: Option<&[String]>,
        unique: bool,
    ) -> Result<Vec<ViewStats>>;
}

/// HTTP client for the stats service
#[derive(Clone)]
pub struct StatsClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl StatsClient {
    pub fn new(config: &StatsConfig) -> Result<Self> {
        let parsed = Url::parse(&config.url)?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("Rendezvous/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl StatsReporter for StatsClient {
    async fn record_hit(&self, hit: &EndpointHit) -> Result<()> {
        let response = self
            .http_client
            .post(self.endpoint("hit"))
            .json(hit)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RendezvousError::Stats(format!(
                "hit for {} rejected with status {}",
                hit.uri,
                response.status()
            )));
        }

        debug!(uri = %hit.uri, ip = %hit.ip, "Hit recorded");
        Ok(())
    }

    async fn get_stats(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        uris: Option<&[String]>,
        unique: bool,
    ) -> Result<Vec<ViewStats>> {
        let mut query = vec![
            ("start", format_timestamp(start)),
            ("end", format_timestamp(end)),
            ("unique", unique.to_string()),
        ];
        if let Some(uris) = uris.filter(|uris| !uris.is_empty()) {
            query.push(("uris", uris.join(",")));
        }

        let response = self
            .http_client
            .get(self.endpoint("stats"))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            log_api_error("stats", &format!("status {}", response.status()), Some("get_stats"));
            return Ok(Vec::new());
        }

        Ok(response.json::<Vec<ViewStats>>().await?)
    }
}

/// Reporter used when the stats service is switched off
#[derive(Debug, Clone, Default)]
pub struct DisabledStats;

#[async_trait]
impl StatsReporter for DisabledStats {
    async fn record_hit(&self, _hit: &EndpointHit) -> Result<()> {
        Ok(())
    }

    async fn get_stats(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _uris: Option<&[String]>,
        _unique: bool,
    ) -> Result<Vec<ViewStats>> {
        Ok(Vec::new())
    }
}

/// Pick the reporter for the configured stats settings
pub fn build_reporter(config: &StatsConfig) -> Result<std::sync::Arc<dyn StatsReporter>> {
    if config.enabled {
        info!(url = %config.url, "Stats reporting enabled");
        Ok(std::sync::Arc::new(StatsClient::new(config)?))
    } else {
        info!("Stats reporting disabled");
        Ok(std::sync::Arc::new(DisabledStats))
    }
}

/// Record a hit, logging and discarding any failure
pub async fn report_hit(reporter: &dyn StatsReporter, hit: EndpointHit) {
    if let Err(e) = reporter.record_hit(&hit).await {
        log_api_error("stats", &e.to_string(), Some(&hit.uri));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_hit_serializes_timestamp_in_wire_format() {
        let hit = EndpointHit {
            app: "explore-with-me".to_string(),
            uri: "/events/1".to_string(),
            ip: "127.0.0.1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
        };

        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["timestamp"], "2024-03-09 14:05:07");

        let back: EndpointHit = serde_json::from_value(json).unwrap();
        assert_eq!(back, hit);
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let json = serde_json::json!({
            "app": "a", "uri": "/events", "ip": "1.1.1.1", "timestamp": "2024-03-09T14:05:07Z"
        });
        assert!(serde_json::from_value::<EndpointHit>(json).is_err());
    }

    #[test]
    fn test_client_rejects_invalid_url() {
        let config = StatsConfig {
            url: "not a url".to_string(),
            app_name: "explore-with-me".to_string(),
            timeout_seconds: 5,
            enabled: true,
        };
        assert!(matches!(StatsClient::new(&config), Err(RendezvousError::UrlParse(_))));
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = StatsConfig {
            url: "http://stats.local:9090/".to_string(),
            app_name: "explore-with-me".to_string(),
            timeout_seconds: 5,
            enabled: true,
        };
        let client = StatsClient::new(&config).unwrap();
        assert_eq!(client.endpoint("hit"), "http://stats.local:9090/hit");
    }

    #[tokio::test]
    async fn test_disabled_stats_is_silent() {
        let stats = DisabledStats;
        report_hit(&stats, EndpointHit::new("app", "/events", "1.2.3.4")).await;
        let now = Utc::now();
        assert!(stats.get_stats(now, now, None, false).await.unwrap().is_empty());
    }
}
