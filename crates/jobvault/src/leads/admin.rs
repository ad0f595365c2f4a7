use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{LeadId, LeadRecord, LeadStatus, UnknownVariant};
use super::export::{export_filename, export_to_vec, ExportError};
use super::query::LeadQuery;
use super::repository::{LeadRepository, RepositoryError};
use super::store::{mock_leads, SnapshotCache};
use super::summary::{new_since, LeadSummary, NewSubmissions};

/// What the dashboard shows when the hosted table cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Surface the storage error.
    None,
    /// Serve the last snapshot written to the local cache.
    #[default]
    Cache,
    /// Serve the static sample rows.
    Mock,
}

impl FromStr for FallbackPolicy {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "cache" => Ok(Self::Cache),
            "mock" => Ok(Self::Mock),
            other => Err(UnknownVariant {
                kind: "fallback policy",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FallbackPolicy::None => "none",
            FallbackPolicy::Cache => "cache",
            FallbackPolicy::Mock => "mock",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSource {
    Live,
    Cache,
    Mock,
}

/// Filtered dashboard view.
#[derive(Debug, Clone, Serialize)]
pub struct LeadListing {
    pub source: ListingSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub summary: LeadSummary,
    pub matched: usize,
    pub leads: Vec<LeadRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub source: ListingSource,
    #[serde(flatten)]
    pub summary: LeadSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_submissions: Option<NewSubmissions>,
}

#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub rows: usize,
    pub body: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

struct LoadedLeads {
    leads: Vec<LeadRecord>,
    source: ListingSource,
    warning: Option<String>,
}

/// Read/modify operations behind the admin dashboard.
pub struct LeadAdminService<R> {
    repository: Arc<R>,
    fallback: FallbackPolicy,
    cache: Option<SnapshotCache>,
}

impl<R> LeadAdminService<R>
where
    R: LeadRepository + 'static,
{
    pub fn new(repository: Arc<R>, fallback: FallbackPolicy, cache: Option<SnapshotCache>) -> Self {
        Self {
            repository,
            fallback,
            cache,
        }
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    pub async fn list(&self, query: &LeadQuery) -> Result<LeadListing, AdminError> {
        let loaded = self.load().await?;
        let summary = LeadSummary::from_leads(&loaded.leads);
        let leads = query.apply(&loaded.leads);

        Ok(LeadListing {
            source: loaded.source,
            warning: loaded.warning,
            summary,
            matched: leads.len(),
            leads,
        })
    }

    pub async fn summary(&self, since: Option<DateTime<Utc>>) -> Result<SummaryView, AdminError> {
        let loaded = self.load().await?;
        Ok(SummaryView {
            source: loaded.source,
            summary: LeadSummary::from_leads(&loaded.leads),
            new_submissions: since.map(|since| new_since(&loaded.leads, since)),
        })
    }

    pub async fn set_status(
        &self,
        id: &LeadId,
        status: LeadStatus,
    ) -> Result<LeadRecord, AdminError> {
        let record = self.repository.update_status(id, status).await?;
        info!(lead_id = %id, status = %status, "lead status updated");
        Ok(record)
    }

    pub async fn save_notes(&self, id: &LeadId, notes: &str) -> Result<LeadRecord, AdminError> {
        let record = self.repository.update_notes(id, notes).await?;
        info!(lead_id = %id, "lead notes updated");
        Ok(record)
    }

    pub async fn delete(&self, id: &LeadId) -> Result<(), AdminError> {
        self.repository.delete(id).await?;
        info!(lead_id = %id, "lead deleted");
        Ok(())
    }

    /// Round trip to storage for the diagnostics endpoint; never falls back.
    pub async fn check_connection(&self) -> Result<(), AdminError> {
        self.repository.check_connection().await?;
        Ok(())
    }

    /// CSV of the filtered view, named for `today`.
    pub async fn export(&self, query: &LeadQuery, today: NaiveDate) -> Result<CsvExport, AdminError> {
        let listing = self.list(query).await?;
        let body = export_to_vec(&listing.leads)?;
        Ok(CsvExport {
            filename: export_filename(today),
            rows: listing.matched,
            body,
        })
    }

    async fn load(&self) -> Result<LoadedLeads, AdminError> {
        let err = match self.repository.list().await {
            Ok(leads) => {
                self.refresh_cache(&leads).await;
                return Ok(LoadedLeads {
                    leads,
                    source: ListingSource::Live,
                    warning: None,
                });
            }
            Err(err) => err,
        };

        warn!(error = %err, fallback = %self.fallback, "lead listing failed");
        match self.fallback {
            FallbackPolicy::None => Err(err.into()),
            FallbackPolicy::Mock => Ok(LoadedLeads {
                leads: mock_leads(),
                source: ListingSource::Mock,
                warning: Some(format!("showing sample data: {err}")),
            }),
            FallbackPolicy::Cache => {
                let snapshot = match &self.cache {
                    Some(cache) => cache.load().await,
                    None => None,
                };
                match snapshot {
                    Some(snapshot) => Ok(LoadedLeads {
                        leads: snapshot.leads,
                        source: ListingSource::Cache,
                        warning: Some(format!(
                            "showing cached data from {}: {err}",
                            snapshot.saved_at.to_rfc3339()
                        )),
                    }),
                    None => Err(err.into()),
                }
            }
        }
    }

    async fn refresh_cache(&self, leads: &[LeadRecord]) {
        if self.fallback != FallbackPolicy::Cache {
            return;
        }
        let Some(cache) = &self.cache else {
            return;
        };

        if let Err(err) = cache.store(leads, Utc::now()).await {
            warn!(error = %err, "lead cache refresh failed");
        }
    }
}
