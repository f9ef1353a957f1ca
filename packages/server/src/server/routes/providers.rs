//! Provider REST routes. Handlers parse input, call an activity and map
//! the outcome; no business logic lives here.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};

use crate::common::ProviderId;
use crate::domains::providers::activities;
use crate::domains::providers::data::{
    CreateProviderInput, ProviderData, ProviderListQuery, ProviderPage, SetApprovalInput,
    UpdateProviderInput,
};
use crate::server::app::AppState;
use crate::server::error::ApiError;

fn parse_id(raw: &str) -> Result<ProviderId, ApiError> {
    ProviderId::parse(raw).map_err(|_| ApiError::BadRequest(format!("invalid provider id: {}", raw)))
}

/// GET /providers
pub async fn list_providers_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<ProviderListQuery>,
) -> Result<Json<ProviderPage>, ApiError> {
    let page = activities::list_providers(&query, &state.deps).await?;
    Ok(Json(page))
}

/// GET /providers/:id
pub async fn get_provider_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProviderData>, ApiError> {
    let id = parse_id(&id)?;
    activities::get_provider(id, &state.deps)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("provider"))
}

/// POST /providers
pub async fn create_provider_handler(
    Extension(state): Extension<AppState>,
    Json(input): Json<CreateProviderInput>,
) -> Result<(StatusCode, Json<ProviderData>), ApiError> {
    let provider = activities::create_provider(input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

/// POST /providers/register
pub async fn register_provider_handler(
    Extension(state): Extension<AppState>,
    Json(input): Json<CreateProviderInput>,
) -> Result<(StatusCode, Json<ProviderData>), ApiError> {
    let provider = activities::register_provider(input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

/// PUT /providers/:id
pub async fn update_provider_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateProviderInput>,
) -> Result<Json<ProviderData>, ApiError> {
    let id = parse_id(&id)?;
    activities::update_provider(id, input, &state.deps)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("provider"))
}

/// PATCH /providers/:id/approval
pub async fn set_approval_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SetApprovalInput>,
) -> Result<Json<ProviderData>, ApiError> {
    let id = parse_id(&id)?;
    activities::set_provider_approval(id, input.approved, &state.deps)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("provider"))
}

/// DELETE /providers/:id
pub async fn delete_provider_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if activities::delete_provider(id, &state.deps).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("provider"))
    }
}
