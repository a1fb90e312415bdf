// src/handlers/buildings.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::envelope,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::building::{CreateBuildingPayload, GenerateFloorsPayload},
};

// ---
// Handler: create_building
// ---
pub async fn create_building(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateBuildingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let building = app_state
        .building_service
        .create_building(&payload.name, payload.address.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, envelope(building)))
}

// ---
// Handler: get_building
// ---
pub async fn get_building(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(building_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let building = app_state
        .building_service
        .get_building(building_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, envelope(building)))
}

// ---
// Handler: list_floors
// ---
pub async fn list_floors(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(building_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let floors = app_state
        .building_service
        .list_floors(building_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, envelope(floors)))
}

// ---
// Handler: generate_floors (substitui todos os andares do prédio)
// ---
pub async fn generate_floors(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(building_id): Path<Uuid>,
    Json(payload): Json<GenerateFloorsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let floors = app_state
        .building_service
        .generate_floors(building_id, payload.basement_floors, payload.above_ground_floors)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, envelope(floors)))
}
