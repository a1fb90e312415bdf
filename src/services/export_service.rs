// src/services/export_service.rs

use std::io::{Cursor, Write};

use anyhow::Context;
use chrono::{DateTime, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{
    common::error::AppError,
    models::source_import::{ImportBatchDetail, SourceSheetWithRows},
    services::workbook::normalize_cell,
};

pub const SUMMARY_FILE_NAME: &str = "_summary.csv";
const MAX_FILE_STEM_CHARS: usize = 80;

static UNSAFE_FILE_CHARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("regex válida"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("regex válida"));

/// Só existe o escopo "all" (todas as abas do lote).
pub fn ensure_supported_scope(scope: Option<&str>) -> Result<(), AppError> {
    match scope.unwrap_or_default() {
        "all" => Ok(()),
        other => Err(AppError::UnsupportedExportScope(other.to_string())),
    }
}

fn csv_writer<W: Write>(out: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out)
}

fn csv_error(e: impl std::error::Error + Send + Sync + 'static) -> AppError {
    AppError::InternalServerError(anyhow::Error::new(e).context("falha ao gerar CSV"))
}

/// Uma linha CSV sem terminador: toda célula entre aspas, aspas internas dobradas.
/// Registro sem células vira linha vazia.
pub fn to_csv_row<I, S>(cells: I) -> Result<String, AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let cells: Vec<S> = cells.into_iter().collect();
    if cells.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv_writer(Vec::new());
    writer.write_record(&cells).map_err(csv_error)?;
    let bytes = writer.into_inner().map_err(|e| csv_error(e.into_error()))?;

    let mut text = String::from_utf8(bytes).map_err(csv_error)?;
    text.pop(); // '\n'
    Ok(text)
}

/// Várias linhas, cada uma terminada em `\n`.
fn csv_document<R, I, S>(rows: R) -> Result<String, AppError>
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut out = String::new();
    for row in rows {
        out.push_str(&to_csv_row(row)?);
        out.push('\n');
    }
    Ok(out)
}

/// Nome de aba -> pedaço seguro de nome de arquivo.
pub fn sanitize_file_name(input: &str) -> String {
    let replaced = UNSAFE_FILE_CHARS_RE.replace_all(input.trim(), "-");
    let replaced = WHITESPACE_RE.replace_all(&replaced, "-");
    replaced.chars().take(MAX_FILE_STEM_CHARS).collect()
}

/// `01-商戶樓層明細.csv`
pub fn sheet_file_name(sheet_order: i32, sheet_name: &str) -> String {
    format!("{:02}-{}.csv", sheet_order + 1, sanitize_file_name(sheet_name))
}

pub fn export_archive_name(building_id: Uuid, now: DateTime<Utc>) -> String {
    format!("building-{}-all-tabs-{}.zip", building_id, now.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

/// Colunas + linhas da aba. As células saem de `row_fields` pelo nome da coluna.
pub fn sheet_to_csv(sheet: &SourceSheetWithRows) -> Result<String, AppError> {
    let columns: Vec<String> = sheet.sheet.columns.iter().map(|c| normalize_cell(c)).collect();

    let data_rows = sheet.source_rows.iter().map(|row| {
        columns
            .iter()
            .map(|column| normalize_cell(row.row_fields.get(column).unwrap_or_default()))
            .collect::<Vec<String>>()
    });

    csv_document(std::iter::once(columns.clone()).chain(data_rows))
}

pub fn summary_csv(sheets: &[SourceSheetWithRows]) -> Result<String, AppError> {
    let header = vec![
        "sheetOrder".to_string(),
        "sheetName".to_string(),
        "rowCount".to_string(),
        "headerRow".to_string(),
    ];
    let lines = sheets.iter().map(|s| {
        vec![
            (s.sheet.sheet_order + 1).to_string(),
            s.sheet.name.clone(),
            s.source_rows.len().to_string(),
            s.sheet.header_row.to_string(),
        ]
    });

    csv_document(std::iter::once(header).chain(lines))
}

/// O ZIP (deflate) com um CSV por aba e o `_summary.csv`.
pub fn build_export_zip(detail: &ImportBatchDetail) -> Result<Vec<u8>, AppError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for sheet in &detail.source_sheets {
        let file_name = sheet_file_name(sheet.sheet.sheet_order, &sheet.sheet.name);
        zip.start_file(file_name.as_str(), options)
            .with_context(|| format!("zip: {file_name}"))?;
        zip.write_all(sheet_to_csv(sheet)?.as_bytes())
            .with_context(|| format!("zip: {file_name}"))?;
    }

    zip.start_file(SUMMARY_FILE_NAME, options).context("zip: resumo")?;
    zip.write_all(summary_csv(&detail.source_sheets)?.as_bytes())
        .context("zip: resumo")?;

    let cursor = zip.finish().context("zip: finalizar")?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use crate::models::source_import::{ImportBatch, RowFields, SourceRow, SourceSheet};
    use sqlx::types::Json;
    use zip::ZipArchive;

    fn detail() -> ImportBatchDetail {
        let building_id = Uuid::new_v4();
        let batch_id = Uuid::new_v4();
        let sheet_id = Uuid::new_v4();
        let columns = vec!["樓層".to_string(), "商戶".to_string(), "備註".to_string()];

        let row = |row_index: i32, values: [&str; 3]| {
            let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            SourceRow {
                id: Uuid::new_v4(),
                source_sheet_id: sheet_id,
                row_index,
                row_fields: Json(RowFields::zip(&columns, &values)),
                row_values: values,
            }
        };

        ImportBatchDetail {
            batch: ImportBatch {
                id: batch_id,
                building_id,
                source_path: "/data/source.xlsx".into(),
                source_file: "source.xlsx".into(),
                notes: None,
                created_at: Utc::now(),
            },
            source_sheets: vec![SourceSheetWithRows {
                sheet: SourceSheet {
                    id: sheet_id,
                    building_id,
                    import_batch_id: batch_id,
                    name: "商戶 樓層/明細".into(),
                    sheet_order: 2,
                    columns: columns.clone(),
                    header_row: 3,
                    row_count: 2,
                    created_at: Utc::now(),
                },
                source_rows: vec![row(4, ["1F", "甲,乙 \"公司\"", ""]), row(7, ["3F", "丙", "x"])],
            }],
        }
    }

    #[test]
    fn csv_rows_quote_every_cell_and_double_inner_quotes() {
        assert_eq!(to_csv_row(["A,B", "\"C\""]).unwrap(), r#""A,B","""C""""#);
        assert_eq!(to_csv_row(["", "x"]).unwrap(), r#""","x""#);
    }

    #[test]
    fn empty_record_is_an_empty_line() {
        assert_eq!(to_csv_row(Vec::<String>::new()).unwrap(), "");

        let mut empty = detail();
        let sheet = &mut empty.source_sheets[0];
        sheet.sheet.columns.clear();
        sheet.source_rows.clear();
        assert_eq!(sheet_to_csv(sheet).unwrap(), "\n");
    }

    #[test]
    fn scope_must_be_all() {
        assert!(ensure_supported_scope(Some("all")).is_ok());
        assert!(matches!(
            ensure_supported_scope(Some("floors")),
            Err(AppError::UnsupportedExportScope(s)) if s == "floors"
        ));
        assert!(ensure_supported_scope(None).is_err());
    }

    #[test]
    fn sanitizes_sheet_names_for_file_names() {
        assert_eq!(sanitize_file_name("  a/b:c*d?  e  "), "a-b-c-d--e");
        assert_eq!(sanitize_file_name("商戶 樓層\t明細"), "商戶-樓層-明細");
        assert_eq!(sanitize_file_name(&"樓".repeat(100)).chars().count(), 80);
        assert_eq!(sheet_file_name(0, "113"), "01-113.csv");
        assert_eq!(sheet_file_name(11, "簽收表"), "12-簽收表.csv");
    }

    #[test]
    fn archive_name_carries_building_and_timestamp() {
        let id = Uuid::nil();
        let now = DateTime::parse_from_rfc3339("2026-03-04T05:06:07.089Z").unwrap().with_timezone(&Utc);
        assert_eq!(
            export_archive_name(id, now),
            "building-00000000-0000-0000-0000-000000000000-all-tabs-2026-03-04T05-06-07-089Z.zip"
        );
    }

    #[test]
    fn zip_holds_one_csv_per_sheet_plus_summary() {
        let bytes = build_export_zip(&detail()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["03-商戶-樓層-明細.csv", "_summary.csv"]);

        let mut sheet_csv = String::new();
        archive.by_name("03-商戶-樓層-明細.csv").unwrap().read_to_string(&mut sheet_csv).unwrap();
        assert_eq!(
            sheet_csv,
            "\"樓層\",\"商戶\",\"備註\"\n\"1F\",\"甲,乙 \"\"公司\"\"\",\"\"\n\"3F\",\"丙\",\"x\"\n"
        );

        let mut summary = String::new();
        archive.by_name(SUMMARY_FILE_NAME).unwrap().read_to_string(&mut summary).unwrap();
        assert_eq!(
            summary,
            "\"sheetOrder\",\"sheetName\",\"rowCount\",\"headerRow\"\n\"3\",\"商戶 樓層/明細\",\"2\",\"3\"\n"
        );

        let file = archive.by_name(SUMMARY_FILE_NAME).unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
    }
}
