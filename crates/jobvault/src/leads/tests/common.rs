use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::StorageConfig;
use crate::leads::admin::{FallbackPolicy, LeadAdminService};
use crate::leads::domain::{LeadId, LeadRecord, LeadStatus, LeadSubmission, NewLead};
use crate::leads::enrichment::RequestContext;
use crate::leads::intake::LeadIntakeService;
use crate::leads::journey::JourneyTracker;
use crate::leads::relay::RecordingRelay;
use crate::leads::repository::{LeadRelay, LeadRepository, RelayError, RepositoryError};
use crate::leads::router::{lead_router, LeadServices};
use crate::leads::store::{mock_leads, InMemoryLeadRepository, SnapshotCache};

pub(super) fn received_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 2, 14, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn context() -> RequestContext {
    RequestContext {
        user_agent: Some("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4)".to_string()),
        client_ip: Some("203.0.113.7".to_string()),
        referer: None,
        received_at: received_at(),
    }
}

pub(super) fn hero_submission() -> LeadSubmission {
    LeadSubmission {
        email: Some("casey@northsideroofing.com".to_string()),
        source: Some("hero".to_string()),
        url: Some("https://jobvault.example/?utm_source=google&utm_medium=cpc".to_string()),
        ..LeadSubmission::default()
    }
}

pub(super) fn get_started_submission() -> LeadSubmission {
    LeadSubmission {
        name: Some("Casey Morgan".to_string()),
        email: Some("casey@northsideroofing.com".to_string()),
        company: Some("Northside Roofing".to_string()),
        job_volume: Some("6-20".to_string()),
        source: Some("get-started".to_string()),
        url: Some("https://jobvault.example/get-started".to_string()),
        ..LeadSubmission::default()
    }
}

pub(super) type MemoryIntake = LeadIntakeService<InMemoryLeadRepository, RecordingRelay>;

pub(super) fn build_intake() -> (MemoryIntake, InMemoryLeadRepository, RecordingRelay) {
    let repository = InMemoryLeadRepository::default();
    let relay = RecordingRelay::default();
    let service = LeadIntakeService::new(
        Arc::new(repository.clone()),
        Arc::new(relay.clone()),
        Arc::new(JourneyTracker::default()),
    );
    (service, repository, relay)
}

pub(super) fn storage_config() -> StorageConfig {
    StorageConfig {
        url: Some("https://leads.example.co".to_string()),
        api_key: Some("service-role-key".to_string()),
        table: "jv_sub_e".to_string(),
        timeout: std::time::Duration::from_secs(5),
    }
}

pub(super) fn services_for<R, W>(
    repository: R,
    relay: W,
    fallback: FallbackPolicy,
    cache: Option<SnapshotCache>,
) -> LeadServices<R, W>
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    let repository = Arc::new(repository);
    LeadServices {
        intake: Arc::new(LeadIntakeService::new(
            Arc::clone(&repository),
            Arc::new(relay),
            Arc::new(JourneyTracker::default()),
        )),
        admin: Arc::new(LeadAdminService::new(repository, fallback, cache)),
        storage: storage_config().status(),
    }
}

pub(super) fn seeded_router() -> (axum::Router, InMemoryLeadRepository) {
    let repository = InMemoryLeadRepository::with_records(mock_leads());
    let services = services_for(
        repository.clone(),
        RecordingRelay::default(),
        FallbackPolicy::None,
        None,
    );
    (lead_router(services), repository)
}

pub(super) struct UnavailableRepository;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl LeadRepository for UnavailableRepository {
    async fn insert(&self, _lead: NewLead) -> Result<LeadRecord, RepositoryError> {
        Err(offline())
    }

    async fn list(&self) -> Result<Vec<LeadRecord>, RepositoryError> {
        Err(offline())
    }

    async fn fetch(&self, _id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        Err(offline())
    }

    async fn update_status(
        &self,
        _id: &LeadId,
        _status: LeadStatus,
    ) -> Result<LeadRecord, RepositoryError> {
        Err(offline())
    }

    async fn update_notes(
        &self,
        _id: &LeadId,
        _notes: &str,
    ) -> Result<LeadRecord, RepositoryError> {
        Err(offline())
    }

    async fn delete(&self, _id: &LeadId) -> Result<(), RepositoryError> {
        Err(offline())
    }

    async fn check_connection(&self) -> Result<(), RepositoryError> {
        Err(offline())
    }
}

pub(super) struct RejectingRelay;

#[async_trait]
impl LeadRelay for RejectingRelay {
    async fn forward(&self, _lead: &NewLead) -> Result<(), RelayError> {
        Err(RelayError::Status(502))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
