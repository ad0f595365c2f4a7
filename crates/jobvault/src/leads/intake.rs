use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{LeadId, LeadStatus, LeadSubmission, NewLead};
use super::enrichment::{self, RequestContext};
use super::journey::JourneyTracker;
use super::repository::{LeadRelay, LeadRepository, RelayError};

/// Source tag used by the hero banner form.
pub const HERO_SOURCE: &str = "hero";
const UNKNOWN_SOURCE: &str = "unknown";

/// Service behind the webhook endpoint: stamps, stores, and relays a form
/// submission. Storage and relay are independent; either may fail alone.
pub struct LeadIntakeService<R, W> {
    repository: Arc<R>,
    relay: Arc<W>,
    journey: Arc<JourneyTracker>,
}

/// Result reported back to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeOutcome {
    pub success: bool,
    pub stored: bool,
    pub relayed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<LeadId>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("an email address is required")]
    MissingEmail,
    #[error("'{0}' is not a valid email address")]
    MalformedEmail(String),
}

impl<R, W> LeadIntakeService<R, W>
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    pub fn new(repository: Arc<R>, relay: Arc<W>, journey: Arc<JourneyTracker>) -> Self {
        Self {
            repository,
            relay,
            journey,
        }
    }

    pub fn journey(&self) -> &JourneyTracker {
        &self.journey
    }

    pub async fn submit(
        &self,
        submission: LeadSubmission,
        context: RequestContext,
    ) -> Result<IntakeOutcome, IntakeError> {
        let email = validate_email(submission.email.as_deref())?;
        let submission = enrichment::enrich(submission, &context);
        let lead = self.prepare(submission, email, context.received_at);

        let (stored, relayed) = tokio::join!(
            self.repository.insert(lead.clone()),
            self.relay.forward(&lead)
        );

        let lead_id = match stored {
            Ok(record) => {
                info!(lead_id = %record.id, form_source = %lead.form_source, "lead stored");
                Some(record.id)
            }
            Err(err) => {
                error!(form_source = %lead.form_source, error = %err, "lead storage failed");
                None
            }
        };

        let relayed = match relayed {
            Ok(()) => {
                info!(form_source = %lead.form_source, "lead relayed to automation webhook");
                true
            }
            Err(RelayError::Disabled) => false,
            Err(err) => {
                warn!(form_source = %lead.form_source, error = %err, "lead relay failed");
                false
            }
        };

        let stored = lead_id.is_some();
        Ok(IntakeOutcome {
            success: stored || relayed,
            stored,
            relayed,
            lead_id,
        })
    }

    fn prepare(&self, submission: LeadSubmission, email: String, now: DateTime<Utc>) -> NewLead {
        let form_source = submission
            .source
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(UNKNOWN_SOURCE)
            .to_ascii_lowercase();
        let submitted_at = submission.submitted_at.unwrap_or(now);

        let (is_from_hero, hero_submission_time) = if form_source == HERO_SOURCE {
            self.journey.record_hero(&email, now);
            (false, None)
        } else {
            let tracked = self.journey.take_hero(&email, now);
            let redirected = submission
                .url
                .as_deref()
                .is_some_and(enrichment::arrived_from_hero);
            let hero_time = submission.hero_submission_time.or(tracked);
            (
                submission.is_from_hero.unwrap_or(false) || redirected || hero_time.is_some(),
                hero_time,
            )
        };

        NewLead {
            name: text(submission.name),
            email,
            company: text(submission.company),
            job_volume: text(submission.job_volume),
            status: LeadStatus::New,
            notes: String::new(),
            submitted_at,
            created_at: Some(now),
            form_source,
            url: submission.url,
            user_agent: submission.user_agent,
            device_type: submission.device_type,
            ip_address: submission.ip,
            utm_source: submission.utm_source,
            utm_medium: submission.utm_medium,
            utm_campaign: submission.utm_campaign,
            is_from_hero,
            hero_submission_time,
        }
    }
}

fn validate_email(raw: Option<&str>) -> Result<String, IntakeError> {
    let email = raw.map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(IntakeError::MissingEmail);
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(IntakeError::MalformedEmail(email.to_string())),
    }
}

fn text(value: Option<String>) -> String {
    value.map(|inner| inner.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert_eq!(validate_email(None), Err(IntakeError::MissingEmail));
        assert_eq!(validate_email(Some("   ")), Err(IntakeError::MissingEmail));
        assert!(matches!(
            validate_email(Some("not-an-email")),
            Err(IntakeError::MalformedEmail(_))
        ));
        assert!(matches!(
            validate_email(Some("@example.com")),
            Err(IntakeError::MalformedEmail(_))
        ));
        assert_eq!(
            validate_email(Some(" lee@example.com ")),
            Ok("lee@example.com".to_string())
        );
    }
}
