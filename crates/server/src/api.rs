//! JSON error envelope and pagination shared by the API modules.

use axum::{http::StatusCode, Json};
use dropshop_core::errors::{ApplicationError, InterfaceError};
use dropshop_db::repositories::RepositoryError;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

pub type ApiFailure = (StatusCode, Json<ApiError>);
pub type ApiResult<T> = Result<Json<T>, ApiFailure>;

pub fn failure(status: StatusCode, message: impl Into<String>) -> ApiFailure {
    (status, Json(ApiError { success: false, error: message.into(), correlation_id: None }))
}

pub fn bad_request(message: impl Into<String>) -> ApiFailure {
    failure(StatusCode::BAD_REQUEST, message)
}

pub fn unauthorized(message: impl Into<String>) -> ApiFailure {
    failure(StatusCode::UNAUTHORIZED, message)
}

pub fn not_found(entity: &'static str, id: impl Into<String>) -> ApiFailure {
    application_failure(ApplicationError::NotFound { entity, id: id.into() })
}

/// Maps an application error to a response. Client errors keep their detail;
/// server-side failures are logged under a correlation id and answered with a
/// generic message.
pub fn application_failure(error: ApplicationError) -> ApiFailure {
    let correlation_id = Uuid::new_v4().to_string();
    let interface = error.into_interface(correlation_id.clone());
    let (status, message) = match &interface {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message.clone()),
        InterfaceError::BadGateway { message, .. } => {
            error!(event_name = "api.upstream_failure", correlation_id = %correlation_id, error = %message);
            (StatusCode::BAD_GATEWAY, interface.user_message().to_string())
        }
        InterfaceError::ServiceUnavailable { message, .. } => {
            error!(event_name = "api.unavailable", correlation_id = %correlation_id, error = %message);
            (StatusCode::SERVICE_UNAVAILABLE, interface.user_message().to_string())
        }
        InterfaceError::Internal { message, .. } => {
            error!(event_name = "api.internal_failure", correlation_id = %correlation_id, error = %message);
            (StatusCode::INTERNAL_SERVER_ERROR, interface.user_message().to_string())
        }
    };
    (status, Json(ApiError { success: false, error: message, correlation_id: Some(correlation_id) }))
}

pub fn repository_failure(error: RepositoryError) -> ApiFailure {
    application_failure(ApplicationError::Persistence(error.to_string()))
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageParams {
    /// Page numbers start at 1; `per_page` is clamped to `1..=MAX_PER_PAGE`.
    pub fn window(&self) -> PageWindow {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        PageWindow { page, per_page }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub per_page: u32,
}

impl PageWindow {
    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn pagination(&self, total: i64) -> Pagination {
        let per_page = i64::from(self.per_page);
        Pagination {
            page: self.page,
            per_page: self.per_page,
            total,
            total_pages: if total <= 0 { 0 } else { (total + per_page - 1) / per_page },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use dropshop_core::errors::ApplicationError;

    use super::{
        application_failure, not_found, PageParams, MAX_PER_PAGE,
    };

    #[test]
    fn per_page_is_capped_and_page_floors_at_one() {
        let window = PageParams { page: Some(0), per_page: Some(500) }.window();
        assert_eq!(window.page, 1);
        assert_eq!(window.per_page, MAX_PER_PAGE);
        assert_eq!(window.offset(), 0);

        let window = PageParams { page: Some(3), per_page: Some(10) }.window();
        assert_eq!(window.offset(), 20);
        assert_eq!(window.pagination(21).total_pages, 3);
        assert_eq!(window.pagination(0).total_pages, 0);
    }

    #[test]
    fn persistence_failures_hide_details() {
        let (status, body) =
            application_failure(ApplicationError::Persistence("disk I/O error".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.error.contains("disk"));
        assert!(body.correlation_id.is_some());
    }

    #[test]
    fn not_found_names_the_entity() {
        let (status, body) = not_found("product", "p-1");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "product `p-1` not found");
        assert!(!body.success);
    }
}
