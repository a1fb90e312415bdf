// src/models/source_import.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// ---
// 1. RowFields: a linha como pares (coluna, valor) em ordem
// ---
// A ordem das colunas importa: a busca por aliases pega o primeiro match.
// No JSON vira um objeto comum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFields(Vec<(String, String)>);

impl RowFields {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// Monta a partir das colunas + valores alinhados (valor ausente = "").
    pub fn zip(columns: &[String], values: &[String]) -> Self {
        Self(
            columns
                .iter()
                .enumerate()
                .map(|(idx, column)| (column.clone(), values.get(idx).cloned().unwrap_or_default()))
                .collect(),
        )
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for RowFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, value) in &self.0 {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RowFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowFieldsVisitor;

        impl<'de> Visitor<'de> for RowFieldsVisitor {
            type Value = RowFields;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("um objeto coluna -> texto")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RowFields, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((column, value)) = access.next_entry::<String, serde_json::Value>()? {
                    let text = match value {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    pairs.push((column, text));
                }
                Ok(RowFields(pairs))
            }
        }

        deserializer.deserialize_map(RowFieldsVisitor)
    }
}

// ---
// 2. Registros de auditoria (tabelas import_batches, source_sheets, source_rows)
// ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub id: Uuid,
    pub building_id: Uuid,
    pub source_path: String,
    pub source_file: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SourceSheet {
    pub id: Uuid,
    pub building_id: Uuid,
    pub import_batch_id: Uuid,
    pub name: String,
    pub sheet_order: i32,     // posição 0-based na planilha
    pub columns: Vec<String>, // únicas
    pub header_row: i32,      // 1-based
    pub row_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SourceRow {
    pub id: Uuid,
    pub source_sheet_id: Uuid,
    pub row_index: i32, // 1-based, posição original na aba
    pub row_values: Vec<String>,
    pub row_fields: Json<RowFields>,
}

/// Uma aba com as suas linhas (preview ou exportação).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSheetWithRows {
    #[serde(flatten)]
    pub sheet: SourceSheet,
    pub source_rows: Vec<SourceRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatchDetail {
    #[serde(flatten)]
    pub batch: ImportBatch,
    pub source_sheets: Vec<SourceSheetWithRows>,
}

// ---
// 3. Payload: Importação
// ---
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportSourcePayload {
    pub file_path: Option<String>,
    pub source_path: Option<String>,
    pub xlsx_path: Option<String>,
    pub path: Option<String>,

    pub sheet_names: Option<Vec<String>>,

    #[serde(default)]
    pub keep_only_required_tabs: bool,

    #[validate(length(max = 2000, message = "As notas devem ter no máximo 2000 caracteres."))]
    pub notes: Option<String>,
}

impl ImportSourcePayload {
    /// O primeiro caminho informado, na ordem filePath > sourcePath > xlsxPath > path.
    pub fn raw_path(&self) -> Option<&str> {
        [&self.file_path, &self.source_path, &self.xlsx_path, &self.path]
            .into_iter()
            .flatten()
            .map(|p| p.trim())
            .find(|p| !p.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuery {
    pub batch_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub scope: Option<String>,
    pub batch_id: Option<Uuid>,
}

// ---
// 4. Resposta: Resumo da importação
// ---

/// Contadores da reconciliação, devolvidos ao operador.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredCounters {
    pub tenants_created: u32,
    pub units_created: u32,
    pub floors_created: u32,
    pub occupancies_created: u32,
    pub rows_with_structured_data: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedSheet {
    pub name: String,
    pub row_count: usize,
    pub header_row: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredSheetStatus {
    pub expected: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub import_batch_id: Uuid,
    pub source_path: String,
    pub source_file: String,
    pub included_sheets: Vec<IncludedSheet>,
    pub required_sheet_status: RequiredSheetStatus,
    pub structured: StructuredCounters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_fields_serialize_as_object_in_column_order() {
        let fields = RowFields::new(vec![
            ("樓層".into(), "1F".into()),
            ("戶號".into(), "A3".into()),
        ]);
        let text = serde_json::to_string(&fields).unwrap();
        assert_eq!(text, r#"{"樓層":"1F","戶號":"A3"}"#);

        let back: RowFields = serde_json::from_str(&text).unwrap();
        assert_eq!(back.get("戶號"), Some("A3"));
    }

    #[test]
    fn zip_pads_missing_values() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let fields = RowFields::zip(&columns, &["x".to_string()]);
        assert_eq!(fields.get("b"), Some(""));
        assert_eq!(fields.iter().count(), 2);
    }

    #[test]
    fn raw_path_prefers_file_path_and_skips_blanks() {
        let payload = ImportSourcePayload {
            file_path: Some("  ".into()),
            source_path: Some("/data/src.xlsx".into()),
            xlsx_path: None,
            path: Some("/other.xlsx".into()),
            sheet_names: None,
            keep_only_required_tabs: false,
            notes: None,
        };
        assert_eq!(payload.raw_path(), Some("/data/src.xlsx"));
    }
}
