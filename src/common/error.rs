// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio. Os serviços só conhecem este tipo;
// a tradução para HTTP acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // DecodeError: os bytes não formam uma planilha legível
    #[error("Falha ao ler a planilha: {0}")]
    WorkbookDecode(String),

    #[error("Nenhuma aba para importar")]
    NoImportableSheets,

    #[error("Informe filePath/sourcePath/xlsxPath/path")]
    MissingSourcePath,

    #[error("Arquivo de origem não encontrado: {0}")]
    SourceFileNotFound(String),

    #[error("Prédio não encontrado")]
    BuildingNotFound,

    #[error("Lote de importação não encontrado")]
    ImportBatchNotFound,

    #[error("Escopo de exportação não suportado: {0}")]
    UnsupportedExportScope(String),

    #[error("Rótulo de andar inválido: {0}")]
    InvalidFloorLabel(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

/// O erro já traduzido, pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Código HTTP + código de máquina de cada variante.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_)
            | AppError::WorkbookDecode(_)
            | AppError::NoImportableSheets
            | AppError::MissingSourcePath
            | AppError::UnsupportedExportScope(_)
            | AppError::InvalidFloorLabel(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),

            AppError::SourceFileNotFound(_)
            | AppError::BuildingNotFound
            | AppError::ImportBatchNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),

            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::WorkbookDecode(_) => "workbook_decode",
            AppError::NoImportableSheets => "no_importable_sheets",
            AppError::MissingSourcePath => "missing_source_path",
            AppError::SourceFileNotFound(_) => "source_file_not_found",
            AppError::BuildingNotFound => "building_not_found",
            AppError::ImportBatchNotFound => "import_batch_not_found",
            AppError::UnsupportedExportScope(_) => "unsupported_export_scope",
            AppError::InvalidFloorLabel(_) => "invalid_floor_label",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "internal_error",
        }
    }

    fn message_arg(&self) -> Option<&str> {
        match self {
            AppError::WorkbookDecode(arg)
            | AppError::SourceFileNotFound(arg)
            | AppError::UnsupportedExportScope(arg)
            | AppError::InvalidFloorLabel(arg) => Some(arg),
            _ => None,
        }
    }

    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, code) = self.status_and_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O `tracing` loga a mensagem detalhada; o cliente recebe a genérica.
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            _ => None,
        };

        ApiError {
            status,
            code,
            error: store.translate(&locale.0, self.message_key(), self.message_arg()),
            details,
        }
    }
}

// Retorna todos os detalhes da validação: campo -> mensagens.
fn validation_details(errors: &validator::ValidationErrors) -> serde_json::Value {
    let mut details = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        details.insert(field.to_string(), json!(messages));
    }
    serde_json::Value::Object(details)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({ "code": self.code, "message": self.error });
        if let Some(details) = self.details {
            error["details"] = details;
        }
        let body = Json(json!({ "ok": false, "error": error }));
        (self.status, body).into_response()
    }
}

// Usado quando não temos o Locale em mãos (ex.: rejeição de extratores).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_codes() {
        assert_eq!(
            AppError::NoImportableSheets.status_and_code(),
            (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
        );
        assert_eq!(
            AppError::SourceFileNotFound("/tmp/x.xlsx".into()).status_and_code(),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );
    }

    #[test]
    fn api_error_carries_localized_message_with_argument() {
        let store = I18nStore::default();
        let api = AppError::SourceFileNotFound("/data/a.xlsx".into())
            .to_api_error(&Locale("en".into()), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert!(api.error.contains("/data/a.xlsx"));
    }
}
