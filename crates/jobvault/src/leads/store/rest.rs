use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::leads::domain::{LeadId, LeadRecord, LeadStatus, NewLead};
use crate::leads::repository::{LeadRepository, RepositoryError};

/// Connection details for a PostgREST-compatible hosted table.
#[derive(Debug, Clone)]
pub struct RestSettings {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
    pub timeout: Duration,
}

/// Lead repository speaking the hosted database's REST dialect
/// (`/rest/v1/<table>` with `eq.` filters).
#[derive(Debug, Clone)]
pub struct RestLeadRepository {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestLeadRepository {
    pub fn new(settings: RestSettings) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("jobvault/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;

        let endpoint = format!(
            "{}/rest/v1/{}",
            settings.base_url.trim_end_matches('/'),
            settings.table
        );

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn returning(&self, method: Method) -> RequestBuilder {
        self.request(method)
            .header("Prefer", "return=representation")
    }

    async fn rows<T: DeserializeOwned>(builder: RequestBuilder) -> Result<Vec<T>, RepositoryError> {
        let response = builder
            .send()
            .await
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        let response = ensure_success(response).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|err| RepositoryError::Decode(err.to_string()))
    }

    async fn single_row(builder: RequestBuilder) -> Result<LeadRecord, RepositoryError> {
        Self::rows::<LeadRecord>(builder)
            .await?
            .into_iter()
            .next()
            .ok_or(RepositoryError::NotFound)
    }
}

async fn ensure_success(response: Response) -> Result<Response, RepositoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RepositoryError::Rejected {
        status: status.as_u16(),
        body,
    })
}

fn id_filter(id: &LeadId) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

#[async_trait]
impl LeadRepository for RestLeadRepository {
    async fn insert(&self, lead: NewLead) -> Result<LeadRecord, RepositoryError> {
        let builder = self.returning(Method::POST).json(&[lead]);
        Self::rows::<LeadRecord>(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Decode("insert returned no rows".to_string()))
    }

    async fn list(&self) -> Result<Vec<LeadRecord>, RepositoryError> {
        let builder = self
            .request(Method::GET)
            .query(&[("select", "*"), ("order", "submitted_at.desc")]);
        Self::rows(builder).await
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        let builder = self
            .request(Method::GET)
            .query(&[("select", "*")])
            .query(&id_filter(id));
        Ok(Self::rows::<LeadRecord>(builder).await?.into_iter().next())
    }

    async fn update_status(
        &self,
        id: &LeadId,
        status: LeadStatus,
    ) -> Result<LeadRecord, RepositoryError> {
        let builder = self
            .returning(Method::PATCH)
            .query(&id_filter(id))
            .json(&json!({ "status": status }));
        Self::single_row(builder).await
    }

    async fn update_notes(&self, id: &LeadId, notes: &str) -> Result<LeadRecord, RepositoryError> {
        let builder = self
            .returning(Method::PATCH)
            .query(&id_filter(id))
            .json(&json!({ "notes": notes }));
        Self::single_row(builder).await
    }

    async fn delete(&self, id: &LeadId) -> Result<(), RepositoryError> {
        let builder = self.returning(Method::DELETE).query(&id_filter(id));
        Self::single_row(builder).await.map(|_| ())
    }

    async fn check_connection(&self) -> Result<(), RepositoryError> {
        let builder = self
            .request(Method::GET)
            .query(&[("select", "id"), ("limit", "1")]);
        Self::rows::<serde_json::Value>(builder).await.map(|_| ())
    }
}
