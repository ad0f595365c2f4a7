use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use jobvault::config::{AppConfig, StorageConfig};
use jobvault::error::AppError;
use jobvault::leads::store::{
    InMemoryLeadRepository, RestLeadRepository, RestSettings, SnapshotCache,
};
use jobvault::leads::{
    DisabledRelay, JourneyTracker, LeadAdminService, LeadId, LeadIntakeService, LeadRecord,
    LeadRelay, LeadRepository, LeadServices, LeadStatus, NewLead, RelayError, RepositoryError,
    WebhookRelay,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Storage picked at startup: the hosted table when credentials are present,
/// otherwise a process-local table.
#[derive(Debug, Clone)]
pub(crate) enum ConfiguredRepository {
    Rest(RestLeadRepository),
    Memory(InMemoryLeadRepository),
}

#[async_trait]
impl LeadRepository for ConfiguredRepository {
    async fn insert(&self, lead: NewLead) -> Result<LeadRecord, RepositoryError> {
        match self {
            Self::Rest(repo) => repo.insert(lead).await,
            Self::Memory(repo) => repo.insert(lead).await,
        }
    }

    async fn list(&self) -> Result<Vec<LeadRecord>, RepositoryError> {
        match self {
            Self::Rest(repo) => repo.list().await,
            Self::Memory(repo) => repo.list().await,
        }
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        match self {
            Self::Rest(repo) => repo.fetch(id).await,
            Self::Memory(repo) => repo.fetch(id).await,
        }
    }

    async fn update_status(
        &self,
        id: &LeadId,
        status: LeadStatus,
    ) -> Result<LeadRecord, RepositoryError> {
        match self {
            Self::Rest(repo) => repo.update_status(id, status).await,
            Self::Memory(repo) => repo.update_status(id, status).await,
        }
    }

    async fn update_notes(&self, id: &LeadId, notes: &str) -> Result<LeadRecord, RepositoryError> {
        match self {
            Self::Rest(repo) => repo.update_notes(id, notes).await,
            Self::Memory(repo) => repo.update_notes(id, notes).await,
        }
    }

    async fn delete(&self, id: &LeadId) -> Result<(), RepositoryError> {
        match self {
            Self::Rest(repo) => repo.delete(id).await,
            Self::Memory(repo) => repo.delete(id).await,
        }
    }

    async fn check_connection(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Rest(repo) => repo.check_connection().await,
            Self::Memory(repo) => repo.check_connection().await,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ConfiguredRelay {
    Webhook(WebhookRelay),
    Disabled(DisabledRelay),
}

#[async_trait]
impl LeadRelay for ConfiguredRelay {
    async fn forward(&self, lead: &NewLead) -> Result<(), RelayError> {
        match self {
            Self::Webhook(relay) => relay.forward(lead).await,
            Self::Disabled(relay) => relay.forward(lead).await,
        }
    }
}

pub(crate) type ConfiguredServices = LeadServices<ConfiguredRepository, ConfiguredRelay>;

fn rest_settings(storage: &StorageConfig) -> Option<RestSettings> {
    match (&storage.url, &storage.api_key) {
        (Some(url), Some(api_key)) => Some(RestSettings {
            base_url: url.clone(),
            api_key: api_key.clone(),
            table: storage.table.clone(),
            timeout: storage.timeout,
        }),
        _ => None,
    }
}

pub(crate) fn configured_repository(config: &AppConfig) -> Result<ConfiguredRepository, AppError> {
    match rest_settings(&config.storage) {
        Some(settings) => {
            let repository = RestLeadRepository::new(settings)?;
            info!(endpoint = repository.endpoint(), "using hosted lead table");
            Ok(ConfiguredRepository::Rest(repository))
        }
        None => {
            warn!("LEADS_STORAGE_URL/LEADS_STORAGE_KEY not set; leads are kept in memory");
            Ok(ConfiguredRepository::Memory(InMemoryLeadRepository::default()))
        }
    }
}

pub(crate) fn configured_relay(config: &AppConfig) -> Result<ConfiguredRelay, AppError> {
    match &config.relay.url {
        Some(url) => {
            let relay = WebhookRelay::new(url.clone(), config.relay.timeout)?;
            info!("forwarding leads to automation webhook");
            Ok(ConfiguredRelay::Webhook(relay))
        }
        None => {
            info!("LEADS_RELAY_URL not set; automation relay disabled");
            Ok(ConfiguredRelay::Disabled(DisabledRelay))
        }
    }
}

pub(crate) fn build_lead_services(config: &AppConfig) -> Result<ConfiguredServices, AppError> {
    let repository = Arc::new(configured_repository(config)?);
    let relay = Arc::new(configured_relay(config)?);
    let journey = Arc::new(JourneyTracker::new(config.journey.ttl()));
    let cache = SnapshotCache::new(config.dashboard.cache_path.clone());

    Ok(LeadServices {
        intake: Arc::new(LeadIntakeService::new(
            Arc::clone(&repository),
            relay,
            journey,
        )),
        admin: Arc::new(LeadAdminService::new(
            repository,
            config.dashboard.fallback,
            Some(cache),
        )),
        storage: config.storage.status(),
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
pub(crate) fn test_config(
    storage: StorageConfig,
    relay_url: Option<&str>,
) -> AppConfig {
    use jobvault::config::{
        AppEnvironment, DashboardConfig, JourneyConfig, RelayConfig, ServerConfig,
        TelemetryConfig,
    };

    AppConfig {
        environment: AppEnvironment::Test,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        telemetry: TelemetryConfig {
            log_level: "info".to_string(),
            ansi: false,
        },
        storage,
        relay: RelayConfig {
            url: relay_url.map(str::to_string),
            timeout: std::time::Duration::from_secs(2),
        },
        dashboard: DashboardConfig {
            fallback: jobvault::leads::FallbackPolicy::Mock,
            cache_path: std::env::temp_dir().join("jobvault-leads-api-test.json"),
        },
        journey: JourneyConfig { ttl_secs: 600 },
    }
}
