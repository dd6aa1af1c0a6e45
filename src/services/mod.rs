//! Services module
//!
//! This module contains business logic services

pub mod event;
pub mod locks;
pub mod participation;
pub mod stats;
pub mod views;

// Re-export commonly used services
pub use event::{parse_event_states, EventService};
pub use locks::{EventLockGuard, EventLocks};
pub use participation::ParticipationService;
pub use stats::{build_reporter, report_hit, DisabledStats, EndpointHit, StatsClient, StatsReporter, ViewStats};
pub use views::{InMemoryViewTracker, RedisViewTracker, ViewTracker};

use std::sync::Arc;

use tracing::info;

use crate::config::settings::{Settings, ViewTrackingBackend};
use crate::database::EntityStore;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub event_service: EventService,
    pub participation_service: ParticipationService,
    pub locks: EventLocks,
    settings: Settings,
}

impl ServiceFactory {
    /// Create a new ServiceFactory, connecting the configured view tracker
    pub async fn new(settings: Settings, store: Arc<dyn EntityStore>) -> Result<Self> {
        let views: Arc<dyn ViewTracker> = match settings.events.view_tracking {
            ViewTrackingBackend::Memory => Arc::new(InMemoryViewTracker::new()),
            ViewTrackingBackend::Redis => Arc::new(RedisViewTracker::new(&settings.redis).await?),
        };
        let stats = build_reporter(&settings.stats)?;

        Ok(Self::with_components(settings, store, views, stats))
    }

    /// Assemble services from already built components
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn EntityStore>,
        views: Arc<dyn ViewTracker>,
        stats: Arc<dyn StatsReporter>,
    ) -> Self {
        let locks = EventLocks::new();
        let event_service = EventService::new(store.clone(), locks.clone(), views, stats, settings.clone());
        let participation_service = ParticipationService::new(store, locks.clone());

        info!(view_tracking = ?settings.events.view_tracking, "Services initialized");

        Self {
            event_service,
            participation_service,
            locks,
            settings,
        }
    }

    /// Health check for all services
    pub fn health_check(&self, database_healthy: bool) -> ServiceHealthStatus {
        ServiceHealthStatus {
            database_healthy,
            stats_enabled: self.settings.stats.enabled,
            view_tracking: self.settings.events.view_tracking,
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub stats_enabled: bool,
    pub view_tracking: ViewTrackingBackend,
}

impl ServiceHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if !self.stats_enabled {
            issues.push("Stats reporting disabled".to_string());
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryEntityStore;

    #[tokio::test]
    async fn test_factory_with_memory_tracker() {
        let mut settings = Settings::default();
        settings.stats.enabled = false;

        let factory = ServiceFactory::new(settings, Arc::new(InMemoryEntityStore::new()))
            .await
            .unwrap();

        let health = factory.health_check(true);
        assert!(health.is_healthy());
        assert_eq!(health.view_tracking, ViewTrackingBackend::Memory);
        assert_eq!(health.get_issues(), vec!["Stats reporting disabled".to_string()]);
    }

    #[test]
    fn test_unhealthy_database_is_reported() {
        let status = ServiceHealthStatus {
            database_healthy: false,
            stats_enabled: true,
            view_tracking: ViewTrackingBackend::Redis,
        };
        assert!(!status.is_healthy());
        assert_eq!(status.get_issues(), vec!["Database connection failed".to_string()]);
    }
}
