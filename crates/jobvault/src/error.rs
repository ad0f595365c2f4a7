use crate::config::ConfigError;
use crate::leads::admin::AdminError;
use crate::leads::repository::{RelayError, RepositoryError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Storage(RepositoryError),
    Relay(RelayError),
    Admin(AdminError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Relay(err) => write!(f, "relay error: {}", err),
            AppError::Admin(err) => write!(f, "dashboard error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Relay(err) => Some(err),
            AppError::Admin(err) => Some(err),
        }
    }
}

/// HTTP status for a storage failure; shared by the admin routes.
pub fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RepositoryError::Rejected { .. } | RepositoryError::Decode(_) => StatusCode::BAD_GATEWAY,
    }
}

pub fn admin_status(err: &AdminError) -> StatusCode {
    match err {
        AdminError::Repository(err) => repository_status(err),
        AdminError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Storage(err) => repository_status(err),
            AppError::Admin(err) => admin_status(err),
            AppError::Relay(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value)
    }
}

impl From<RelayError> for AppError {
    fn from(value: RelayError) -> Self {
        Self::Relay(value)
    }
}

impl From<AdminError> for AppError {
    fn from(value: AdminError) -> Self {
        Self::Admin(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::export::ExportError;

    fn admin(err: RepositoryError) -> AppError {
        AppError::Admin(AdminError::Repository(err))
    }

    #[test]
    fn storage_failures_map_like_the_admin_routes() {
        assert_eq!(admin(RepositoryError::NotFound).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            admin(RepositoryError::Unavailable("connection refused".to_string())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Storage(RepositoryError::Unavailable("timed out".to_string())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Storage(RepositoryError::Rejected {
                status: 401,
                body: "Invalid API key".to_string(),
            })
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            admin(RepositoryError::Decode("missing id".to_string())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn local_failures_are_internal() {
        let export = AppError::Admin(AdminError::Export(ExportError::Io(
            std::io::Error::other("disk full"),
        )));
        assert_eq!(export.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::Io(std::io::Error::other("disk full")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Relay(RelayError::Status(500)).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn response_carries_status_and_message() {
        let response = admin(RepositoryError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
