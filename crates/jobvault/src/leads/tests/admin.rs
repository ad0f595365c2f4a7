use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::leads::admin::{AdminError, FallbackPolicy, LeadAdminService, ListingSource};
use crate::leads::domain::{DeviceType, LeadId, LeadStatus};
use crate::leads::query::{LeadQuery, SortOrder};
use crate::leads::repository::{LeadRepository, RepositoryError};
use crate::leads::store::{mock_leads, InMemoryLeadRepository, SnapshotCache};

use super::common::UnavailableRepository;

fn seeded() -> (LeadAdminService<InMemoryLeadRepository>, InMemoryLeadRepository) {
    let repository = InMemoryLeadRepository::with_records(mock_leads());
    let service = LeadAdminService::new(
        Arc::new(repository.clone()),
        FallbackPolicy::None,
        None,
    );
    (service, repository)
}

#[tokio::test]
async fn live_listing_applies_filters_but_summarises_everything() {
    let (service, _) = seeded();
    let query = LeadQuery {
        status: Some(LeadStatus::Pending),
        device: Some(DeviceType::Mobile),
        ..LeadQuery::default()
    };

    let listing = service.list(&query).await.expect("listing");

    assert_eq!(listing.source, ListingSource::Live);
    assert_eq!(listing.warning, None);
    assert_eq!(listing.summary.total, 4);
    assert_eq!(listing.summary.pending, 3);
    assert_eq!(listing.matched, 2);
    let ids: Vec<_> = listing.leads.iter().map(|lead| lead.id.0.as_str()).collect();
    assert_eq!(ids, ["2", "4"]);
}

#[tokio::test]
async fn ascending_sort_reverses_the_listing() {
    let (service, _) = seeded();
    let query = LeadQuery {
        sort: SortOrder::Asc,
        ..LeadQuery::default()
    };

    let listing = service.list(&query).await.expect("listing");
    let ids: Vec<_> = listing.leads.iter().map(|lead| lead.id.0.as_str()).collect();
    assert_eq!(ids, ["4", "3", "2", "1"]);
}

#[tokio::test]
async fn unavailable_storage_surfaces_error_without_fallback() {
    let service = LeadAdminService::new(Arc::new(UnavailableRepository), FallbackPolicy::None, None);

    let err = service
        .list(&LeadQuery::default())
        .await
        .expect_err("storage offline");
    assert!(matches!(
        err,
        AdminError::Repository(RepositoryError::Unavailable(_))
    ));
}

#[tokio::test]
async fn mock_fallback_serves_sample_rows() {
    let service = LeadAdminService::new(Arc::new(UnavailableRepository), FallbackPolicy::Mock, None);

    let listing = service
        .list(&LeadQuery::default())
        .await
        .expect("mock listing");

    assert_eq!(listing.source, ListingSource::Mock);
    assert_eq!(listing.matched, 4);
    let warning = listing.warning.expect("warning present");
    assert!(warning.contains("sample data"));
}

#[tokio::test]
async fn cache_fallback_serves_last_live_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = SnapshotCache::new(dir.path().join("leads.json"));

    let live = LeadAdminService::new(
        Arc::new(InMemoryLeadRepository::with_records(mock_leads())),
        FallbackPolicy::Cache,
        Some(cache.clone()),
    );
    live.list(&LeadQuery::default()).await.expect("live listing");
    assert!(cache.load().await.is_some());

    let offline = LeadAdminService::new(
        Arc::new(UnavailableRepository),
        FallbackPolicy::Cache,
        Some(cache),
    );
    let listing = offline
        .list(&LeadQuery::default())
        .await
        .expect("cached listing");

    assert_eq!(listing.source, ListingSource::Cache);
    assert_eq!(listing.leads, mock_leads());
    assert!(listing
        .warning
        .expect("warning present")
        .contains("cached data"));
}

#[tokio::test]
async fn cache_fallback_without_snapshot_propagates_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = LeadAdminService::new(
        Arc::new(UnavailableRepository),
        FallbackPolicy::Cache,
        Some(SnapshotCache::new(dir.path().join("missing.json"))),
    );

    assert!(service.list(&LeadQuery::default()).await.is_err());
}

#[tokio::test]
async fn summary_reports_new_submissions_since_checkpoint() {
    let (service, _) = seeded();
    let since = Utc
        .with_ymd_and_hms(2025, 3, 12, 0, 0, 0)
        .single()
        .expect("valid timestamp");

    let view = service.summary(Some(since)).await.expect("summary");

    assert_eq!(view.summary.total, 4);
    assert_eq!(view.summary.processed, 1);
    let fresh = view.new_submissions.expect("new submissions");
    assert_eq!(fresh.count, 2);

    let plain = service.summary(None).await.expect("summary");
    assert!(plain.new_submissions.is_none());
}

#[tokio::test]
async fn status_notes_and_delete_round_trip() {
    let (service, repository) = seeded();
    let id = LeadId::from("1");

    let updated = service
        .set_status(&id, LeadStatus::Processed)
        .await
        .expect("status update");
    assert_eq!(updated.status(), LeadStatus::Processed);

    let noted = service
        .save_notes(&id, "Called back, wants a demo on Friday")
        .await
        .expect("notes update");
    assert_eq!(noted.lead.notes, "Called back, wants a demo on Friday");
    assert_eq!(noted.status(), LeadStatus::Processed);

    service.delete(&id).await.expect("delete");
    assert_eq!(repository.fetch(&id).await.expect("fetch"), None);

    let missing = service
        .set_status(&id, LeadStatus::Pending)
        .await
        .expect_err("row is gone");
    assert!(matches!(
        missing,
        AdminError::Repository(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn export_names_file_and_counts_filtered_rows() {
    let (service, _) = seeded();
    let query = LeadQuery {
        source: Some("get-started".to_string()),
        ..LeadQuery::default()
    };
    let today = NaiveDate::from_ymd_opt(2025, 4, 2).expect("valid date");

    let export = service.export(&query, today).await.expect("export");

    assert_eq!(export.filename, "jobvault-leads-2025-04-02.csv");
    assert_eq!(export.rows, 2);
    let body = String::from_utf8(export.body).expect("utf-8");
    assert_eq!(body.lines().count(), 3);
    assert!(body.contains("Becker Plumbing"));
    assert!(!body.contains("BrightSpark Electric"));
}

#[tokio::test]
async fn connection_check_reports_storage_state() {
    let (service, _) = seeded();
    assert!(service.check_connection().await.is_ok());

    let offline = LeadAdminService::new(Arc::new(UnavailableRepository), FallbackPolicy::Mock, None);
    assert!(offline.check_connection().await.is_err());
}
