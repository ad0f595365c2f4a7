use async_trait::async_trait;

use super::domain::{LeadId, LeadRecord, LeadStatus, NewLead};

/// Storage abstraction over the hosted lead table so the intake and admin
/// services can be exercised in isolation.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn insert(&self, lead: NewLead) -> Result<LeadRecord, RepositoryError>;
    /// All rows, newest submission first.
    async fn list(&self) -> Result<Vec<LeadRecord>, RepositoryError>;
    async fn fetch(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError>;
    async fn update_status(
        &self,
        id: &LeadId,
        status: LeadStatus,
    ) -> Result<LeadRecord, RepositoryError>;
    async fn update_notes(&self, id: &LeadId, notes: &str) -> Result<LeadRecord, RepositoryError>;
    async fn delete(&self, id: &LeadId) -> Result<(), RepositoryError>;
    /// Cheap round trip used by the storage diagnostics endpoint.
    async fn check_connection(&self) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("lead not found")]
    NotFound,
    #[error("lead storage unavailable: {0}")]
    Unavailable(String),
    #[error("lead storage rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected lead storage response: {0}")]
    Decode(String),
}

/// Outbound hook that mirrors every submission to the marketing automation
/// webhook.
#[async_trait]
pub trait LeadRelay: Send + Sync {
    async fn forward(&self, lead: &NewLead) -> Result<(), RelayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay webhook is not configured")]
    Disabled,
    #[error("relay webhook answered with status {0}")]
    Status(u16),
    #[error("relay transport unavailable: {0}")]
    Transport(String),
}
