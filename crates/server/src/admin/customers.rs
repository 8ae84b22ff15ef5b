use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use dropshop_core::domain::customer::{is_plausible_email, Customer, CustomerId};
use serde::{Deserialize, Serialize};

use crate::api::{bad_request, not_found, repository_failure, ApiFailure, ApiResult, PageParams, Pagination};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewCustomer {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerList {
    pub success: bool,
    pub customers: Vec<Customer>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub success: bool,
    pub customer: Customer,
    pub created: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<CustomerList> {
    let window = params.window();
    let customers =
        state.customers.list(window.per_page, window.offset()).await.map_err(repository_failure)?;
    let total = state.customers.count().await.map_err(repository_failure)?;
    Ok(Json(CustomerList { success: true, customers, pagination: window.pagination(total) }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CustomerResponse> {
    let customer = state
        .customers
        .find_by_id(&CustomerId(id.clone()))
        .await
        .map_err(repository_failure)?
        .ok_or_else(|| not_found("customer", id))?;
    Ok(Json(CustomerResponse { success: true, customer, created: false }))
}

/// Creates the customer or fills in blanks on the existing record with that email.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<NewCustomer>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiFailure> {
    if !is_plausible_email(&request.email) {
        return Err(bad_request("email is not a valid email address"));
    }

    let candidate = Customer::new(&request.email, request.name, request.phone, Utc::now());
    let (customer, created) =
        state.customers.upsert_by_email(candidate).await.map_err(repository_failure)?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(CustomerResponse { success: true, customer, created })))
}
