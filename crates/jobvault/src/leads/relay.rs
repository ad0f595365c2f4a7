use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::domain::NewLead;
use super::repository::{LeadRelay, RelayError};

/// Posts each submission as JSON to the marketing automation catch hook.
#[derive(Debug, Clone)]
pub struct WebhookRelay {
    client: reqwest::Client,
    url: String,
}

impl WebhookRelay {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RelayError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LeadRelay for WebhookRelay {
    async fn forward(&self, lead: &NewLead) -> Result<(), RelayError> {
        let response = self
            .client
            .post(&self.url)
            .json(lead)
            .send()
            .await
            .map_err(|err| RelayError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RelayError::Status(status.as_u16()))
        }
    }
}

/// Stand-in used when no automation webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRelay;

#[async_trait]
impl LeadRelay for DisabledRelay {
    async fn forward(&self, _lead: &NewLead) -> Result<(), RelayError> {
        Err(RelayError::Disabled)
    }
}

/// Keeps forwarded payloads in memory; used by the demo command and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingRelay {
    forwarded: Arc<Mutex<Vec<NewLead>>>,
}

impl RecordingRelay {
    pub fn forwarded(&self) -> Vec<NewLead> {
        self.forwarded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LeadRelay for RecordingRelay {
    async fn forward(&self, lead: &NewLead) -> Result<(), RelayError> {
        self.forwarded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(lead.clone());
        Ok(())
    }
}
