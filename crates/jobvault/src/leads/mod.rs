//! Lead capture and review.
//!
//! Form submissions enter through [`intake`], are persisted by a
//! [`repository::LeadRepository`] implementation and mirrored to the automation
//! webhook by a [`repository::LeadRelay`]. The admin dashboard reads the same
//! rows back through [`admin`], which layers filtering, CSV export, and the
//! cache/mock fallbacks on top of the repository.

pub mod admin;
pub mod domain;
pub mod enrichment;
pub mod export;
pub mod intake;
pub mod journey;
pub mod query;
pub mod relay;
pub mod repository;
pub mod router;
pub mod store;
pub mod summary;

#[cfg(test)]
mod tests;

pub use admin::{
    AdminError, CsvExport, FallbackPolicy, LeadAdminService, LeadListing, ListingSource,
    SummaryView,
};
pub use domain::{DeviceType, LeadId, LeadRecord, LeadStatus, LeadSubmission, NewLead};
pub use enrichment::{RequestContext, UtmParams};
pub use export::{export_csv, export_filename, ExportError, EXPORT_HEADERS};
pub use intake::{IntakeError, IntakeOutcome, LeadIntakeService};
pub use journey::JourneyTracker;
pub use query::{LeadQuery, SortOrder};
pub use relay::{DisabledRelay, RecordingRelay, WebhookRelay};
pub use repository::{LeadRelay, LeadRepository, RelayError, RepositoryError};
pub use router::{lead_router, LeadServices};
pub use summary::{LeadSummary, NewSubmissions};
