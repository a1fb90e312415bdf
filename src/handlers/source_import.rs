// src/handlers/source_import.rs

use axum::{
    extract::{Path, Query, State},
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
    models::source_import::{BatchQuery, ImportSourcePayload},
};

// ---
// Handler: import_source_xlsx
// ---
// Lê a planilha do disco, grava a trilha de auditoria e reconcilia
// locatários/andares/unidades/ocupações numa transação só.
pub async fn import_source_xlsx(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(building_id): Path<Uuid>,
    Json(payload): Json<ImportSourcePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state
        .import_service
        .import_workbook(building_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, envelope(summary)))
}

// ---
// Handler: preview_source_xlsx (último lote, ou ?batchId=)
// ---
pub async fn preview_source_xlsx(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(building_id): Path<Uuid>,
    Query(query): Query<BatchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .import_service
        .preview_batch(building_id, query.batch_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, envelope(detail)))
}
