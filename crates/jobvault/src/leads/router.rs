use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::admin::{AdminError, LeadAdminService};
use super::domain::{LeadId, LeadStatus, LeadSubmission};
use super::enrichment::RequestContext;
use super::intake::LeadIntakeService;
use super::query::LeadQuery;
use super::repository::{LeadRelay, LeadRepository};
use crate::config::StorageStatus;
use crate::error::admin_status;

/// Services shared by the lead endpoints.
pub struct LeadServices<R, W> {
    pub intake: Arc<LeadIntakeService<R, W>>,
    pub admin: Arc<LeadAdminService<R>>,
    pub storage: StorageStatus,
}

impl<R, W> Clone for LeadServices<R, W> {
    fn clone(&self) -> Self {
        Self {
            intake: Arc::clone(&self.intake),
            admin: Arc::clone(&self.admin),
            storage: self.storage.clone(),
        }
    }
}

/// Router exposing the webhook intake and the admin dashboard API.
pub fn lead_router<R, W>(services: LeadServices<R, W>) -> Router
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    Router::new()
        .route("/api/webhook", post(webhook_handler::<R, W>))
        .route("/api/admin/leads", get(list_handler::<R, W>))
        .route("/api/admin/leads/summary", get(summary_handler::<R, W>))
        .route("/api/admin/leads/export", get(export_handler::<R, W>))
        .route("/api/admin/leads/:lead_id", delete(delete_handler::<R, W>))
        .route(
            "/api/admin/leads/:lead_id/status",
            patch(status_handler::<R, W>),
        )
        .route(
            "/api/admin/leads/:lead_id/notes",
            patch(notes_handler::<R, W>),
        )
        .route("/api/check-storage", get(check_storage_handler::<R, W>))
        .route("/api/setup-db", get(setup_db_handler::<R, W>))
        .with_state(services)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdate {
    pub(crate) status: LeadStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotesUpdate {
    #[serde(default)]
    pub(crate) notes: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SummaryParams {
    #[serde(default)]
    pub(crate) since: Option<DateTime<Utc>>,
}

pub(crate) async fn webhook_handler<R, W>(
    State(services): State<LeadServices<R, W>>,
    headers: HeaderMap,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> Response
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            error!(error = %rejection, "unreadable webhook payload");
            let payload = json!({
                "success": false,
                "error": rejection.body_text(),
            });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    let context = RequestContext::from_headers(&headers, Utc::now());
    match services.intake.submit(submission, context).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(invalid) => {
            let payload = json!({
                "success": false,
                "error": invalid.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn list_handler<R, W>(
    State(services): State<LeadServices<R, W>>,
    Query(query): Query<LeadQuery>,
) -> Response
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    match services.admin.list(&query).await {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn summary_handler<R, W>(
    State(services): State<LeadServices<R, W>>,
    Query(params): Query<SummaryParams>,
) -> Response
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    match services.admin.summary(params.since).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn export_handler<R, W>(
    State(services): State<LeadServices<R, W>>,
    Query(query): Query<LeadQuery>,
) -> Response
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    let today = Utc::now().date_naive();
    match services.admin.export(&query, today).await {
        Ok(export) => {
            let headers = [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", export.filename),
                ),
            ];
            (StatusCode::OK, headers, export.body).into_response()
        }
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn status_handler<R, W>(
    State(services): State<LeadServices<R, W>>,
    Path(lead_id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Response
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    let update = match payload {
        Ok(Json(update)) => update,
        Err(rejection) => return rejection_response(rejection),
    };
    let id = LeadId(lead_id);
    match services.admin.set_status(&id, update.status).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn notes_handler<R, W>(
    State(services): State<LeadServices<R, W>>,
    Path(lead_id): Path<String>,
    payload: Result<Json<NotesUpdate>, JsonRejection>,
) -> Response
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    let update = match payload {
        Ok(Json(update)) => update,
        Err(rejection) => return rejection_response(rejection),
    };
    let id = LeadId(lead_id);
    match services.admin.save_notes(&id, &update.notes).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn delete_handler<R, W>(
    State(services): State<LeadServices<R, W>>,
    Path(lead_id): Path<String>,
) -> Response
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    let id = LeadId(lead_id);
    match services.admin.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn check_storage_handler<R, W>(
    State(services): State<LeadServices<R, W>>,
) -> Response
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    (StatusCode::OK, Json(services.storage.clone())).into_response()
}

pub(crate) async fn setup_db_handler<R, W>(State(services): State<LeadServices<R, W>>) -> Response
where
    R: LeadRepository + 'static,
    W: LeadRelay + 'static,
{
    match services.admin.check_connection().await {
        Ok(()) => {
            let payload = json!({
                "success": true,
                "message": "Lead table reachable",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => {
            error!(error = %err, "lead table connection check failed");
            let payload = json!({
                "success": false,
                "message": format!("Lead table unreachable: {err}"),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({ "error": rejection.body_text() });
    (rejection.status(), Json(payload)).into_response()
}

fn admin_error_response(err: AdminError) -> Response {
    let status = admin_status(&err);

    if status.is_server_error() {
        error!(error = %err, "admin request failed");
    }

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
