// src/handlers/export.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::source_import::ExportQuery,
    services::export_service::{build_export_zip, ensure_supported_scope, export_archive_name},
};

// ---
// Handler: export_csv (ZIP com um CSV por aba do lote)
// ---
pub async fn export_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(building_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    ensure_supported_scope(query.scope.as_deref()).map_err(to_api)?;

    // Exportação leva todas as linhas (sem limite)
    let detail = app_state
        .import_service
        .load_batch(building_id, query.batch_id, None)
        .await
        .map_err(to_api)?;

    let built = tokio::task::spawn_blocking(move || build_export_zip(&detail).map(|zip| (detail.batch.id, zip)))
        .await
        .map_err(|e| to_api(AppError::InternalServerError(anyhow::anyhow!(e))))?;
    let (batch_id, zip) = built.map_err(to_api)?;

    let file_name = export_archive_name(building_id, Utc::now());
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|e| to_api(AppError::InternalServerError(e.into())))?;
    let batch_header = HeaderValue::from_str(&batch_id.to_string())
        .map_err(|e| to_api(AppError::InternalServerError(e.into())))?;

    tracing::info!("📦 Lote {} exportado ({} bytes)", batch_id, zip.len());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, disposition),
            (HeaderName::from_static("x-import-batch-id"), batch_header),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        zip,
    ))
}
