use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{DeviceType, LeadId, LeadRecord, LeadStatus};

/// Headline counters shown above the dashboard table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeadSummary {
    pub total: usize,
    pub pending: usize,
    pub processed: usize,
    pub mobile: usize,
    pub desktop: usize,
}

impl LeadSummary {
    pub fn from_leads(leads: &[LeadRecord]) -> Self {
        leads.iter().fold(Self::default(), |mut summary, record| {
            summary.total += 1;
            if record.status().is_pending() {
                summary.pending += 1;
            } else if record.status() == LeadStatus::Processed {
                summary.processed += 1;
            }
            match record.lead.device_type {
                Some(DeviceType::Mobile) => summary.mobile += 1,
                Some(DeviceType::Desktop) => summary.desktop += 1,
                None => {}
            }
            summary
        })
    }
}

/// Rows that arrived after the dashboard's previous fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewSubmissions {
    pub since: Option<DateTime<Utc>>,
    pub count: usize,
    pub ids: Vec<LeadId>,
}

pub fn new_since(leads: &[LeadRecord], since: DateTime<Utc>) -> NewSubmissions {
    let ids: Vec<LeadId> = leads
        .iter()
        .filter(|record| record.submitted_at() > since)
        .map(|record| record.id.clone())
        .collect();

    NewSubmissions {
        since: Some(since),
        count: ids.len(),
        ids,
    }
}
