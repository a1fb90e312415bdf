// src/services/import_service.rs

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{db_utils::lock_building_for_import, error::AppError},
    db::{BuildingRepository, PgImportWriter, SourceImportRepository},
    models::source_import::{
        ImportBatchDetail, ImportSourcePayload, ImportSummary, IncludedSheet, RequiredSheetStatus,
        SourceSheetWithRows, StructuredCounters,
    },
    services::{
        extraction::extract_structured_candidate,
        reconciliation::{BuildingSnapshot, ImportWriter, NewSourceRow, NewSourceSheet, Reconciler},
        sheet_parser::{parse_workbook, ParsedSheet},
        workbook::decode_workbook,
    },
};

/// As abas que o pacote de entrega do prédio deveria trazer.
pub const REQUIRED_SOURCE_SHEETS: &[&str] = &[
    "點交時間表",
    "113",
    "商戶樓層明細",
    "商戶緊急聯絡電話",
    "產業人數表",
    "商戶戶MAIL",
    "簽收表",
];

/// Linhas por INSERT de `source_rows`.
pub const SOURCE_ROW_CHUNK_SIZE: usize = 250;

/// Linhas por aba no preview.
pub const PREVIEW_ROW_LIMIT: i64 = 100;

// ---
// Seleção de abas
// ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelection {
    Named(Vec<String>),
    RequiredOnly,
    All,
}

impl SheetSelection {
    /// Nomes explícitos (não vazios) ganham de `keepOnlyRequiredTabs`.
    pub fn from_request(sheet_names: Option<&[String]>, keep_only_required: bool) -> Self {
        let names: Vec<String> = sheet_names
            .unwrap_or_default()
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        if !names.is_empty() {
            SheetSelection::Named(names)
        } else if keep_only_required {
            SheetSelection::RequiredOnly
        } else {
            SheetSelection::All
        }
    }

    fn includes(&self, sheet_name: &str) -> bool {
        match self {
            SheetSelection::Named(names) => names.iter().any(|n| n == sheet_name),
            SheetSelection::RequiredOnly => REQUIRED_SOURCE_SHEETS.contains(&sheet_name),
            SheetSelection::All => true,
        }
    }
}

/// Filtra mantendo o `sheet_order` original. Nada sobrou -> `NoImportableSheets`.
pub fn select_sheets(sheets: Vec<ParsedSheet>, selection: &SheetSelection) -> Result<Vec<ParsedSheet>, AppError> {
    let included: Vec<ParsedSheet> = sheets
        .into_iter()
        .filter(|sheet| selection.includes(&sheet.name))
        .collect();

    if included.is_empty() {
        return Err(AppError::NoImportableSheets);
    }
    Ok(included)
}

/// Abas obrigatórias ausentes da planilha (independe da seleção).
pub fn required_sheet_status(workbook_sheet_names: &[&str]) -> RequiredSheetStatus {
    RequiredSheetStatus {
        expected: REQUIRED_SOURCE_SHEETS.iter().map(|s| s.to_string()).collect(),
        missing: REQUIRED_SOURCE_SHEETS
            .iter()
            .filter(|required| !workbook_sheet_names.contains(required))
            .map(|s| s.to_string())
            .collect(),
    }
}

/// Caminho relativo é resolvido contra o `IMPORT_ROOT`.
pub fn resolve_source_path(import_root: &Path, raw: &str) -> PathBuf {
    let candidate = Path::new(raw);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        import_root.join(candidate)
    }
}

// ---
// O pipeline (independente de banco)
// ---
/// Dados do lote que abre a importação.
#[derive(Debug, Clone, Copy)]
pub struct NewImportBatch<'a> {
    pub building_id: Uuid,
    pub source_path: &'a str,
    pub source_file: &'a str,
    pub notes: Option<&'a str>,
}

/// Grava o lote, as abas e as linhas brutas e reconcilia cada linha, em ordem.
/// Tudo passa pelo mesmo `writer`; se qualquer passo falhar o erro sobe e quem
/// abriu a transação descarta tudo.
pub async fn run_import<W: ImportWriter + ?Sized>(
    writer: &mut W,
    batch: NewImportBatch<'_>,
    sheets: &[ParsedSheet],
    snapshot: BuildingSnapshot,
) -> Result<(Uuid, StructuredCounters), AppError> {
    let building_id = batch.building_id;
    let import_batch_id = writer
        .create_import_batch(building_id, batch.source_path, batch.source_file, batch.notes)
        .await?;

    let mut reconciler = Reconciler::new(writer, building_id, snapshot);

    for sheet in sheets {
        let sheet_id = reconciler
            .writer()
            .create_source_sheet(NewSourceSheet {
                building_id,
                import_batch_id,
                name: &sheet.name,
                sheet_order: sheet.sheet_order as i32,
                columns: &sheet.columns,
                header_row: sheet.header_row_index as i32,
                row_count: sheet.rows.len() as i32,
            })
            .await?;

        let rows: Vec<NewSourceRow<'_>> = sheet
            .rows
            .iter()
            .map(|row| NewSourceRow {
                row_index: row.row_index as i32,
                row_values: &row.row_values,
                row_fields: &row.row_fields,
            })
            .collect();
        for chunk in rows.chunks(SOURCE_ROW_CHUNK_SIZE) {
            reconciler.writer().create_source_rows(building_id, sheet_id, chunk).await?;
        }

        for row in &sheet.rows {
            let candidate = extract_structured_candidate(&row.row_fields);
            reconciler.apply(&sheet.name, row.row_index, &candidate).await?;
        }

        tracing::debug!("Aba '{}' gravada: {} linhas", sheet.name, sheet.rows.len());
    }

    Ok((import_batch_id, reconciler.counters()))
}

// ---
// O serviço
// ---
#[derive(Clone)]
pub struct ImportService {
    pool: PgPool,
    building_repo: BuildingRepository,
    source_repo: SourceImportRepository,
    import_root: PathBuf,
}

impl ImportService {
    pub fn new(
        pool: PgPool,
        building_repo: BuildingRepository,
        source_repo: SourceImportRepository,
        import_root: PathBuf,
    ) -> Self {
        Self { pool, building_repo, source_repo, import_root }
    }

    /// POST /import/source-xlsx
    pub async fn import_workbook(
        &self,
        building_id: Uuid,
        payload: &ImportSourcePayload,
    ) -> Result<ImportSummary, AppError> {
        let raw_path = payload.raw_path().ok_or(AppError::MissingSourcePath)?;

        if self.building_repo.find_building(building_id).await?.is_none() {
            return Err(AppError::BuildingNotFound);
        }

        let path = resolve_source_path(&self.import_root, raw_path);
        let source_path = path.display().to_string();
        let source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_path.clone());

        tracing::info!("📥 Importando '{}' para o prédio {}", source_path, building_id);

        // 1. Lê o arquivo (inexistente ou ilegível = 404)
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|_| AppError::SourceFileNotFound(source_path.clone()))?;

        // 2. Decodifica fora do runtime: calamine é síncrono e pesado
        let parsed = tokio::task::spawn_blocking(move || decode_workbook(bytes).map(|sheets| parse_workbook(&sheets)))
            .await
            .map_err(|e| AppError::InternalServerError(anyhow!(e)))??;

        let workbook_sheet_names: Vec<&str> = parsed.iter().map(|s| s.name.as_str()).collect();
        let required_status = required_sheet_status(&workbook_sheet_names);

        // 3. Seleção
        let selection = SheetSelection::from_request(payload.sheet_names.as_deref(), payload.keep_only_required_tabs);
        let sheets = select_sheets(parsed, &selection)?;

        // 4. Transação: trava o prédio, lê o snapshot, grava tudo, commit
        let mut tx = self.pool.begin().await?;
        lock_building_for_import(&mut tx, building_id).await?;
        let snapshot = self.load_snapshot(&mut tx, building_id).await?;

        let batch = NewImportBatch {
            building_id,
            source_path: &source_path,
            source_file: &source_file,
            notes: payload.notes.as_deref(),
        };
        let mut writer = PgImportWriter::new(&mut tx, &self.building_repo, &self.source_repo);
        let (import_batch_id, structured) = run_import(&mut writer, batch, &sheets, snapshot).await?;

        tx.commit().await?;

        tracing::info!(
            "✅ Importação {} concluída: {} abas, {} locatários, {} andares, {} unidades, {} ocupações",
            import_batch_id,
            sheets.len(),
            structured.tenants_created,
            structured.floors_created,
            structured.units_created,
            structured.occupancies_created
        );

        Ok(ImportSummary {
            import_batch_id,
            source_path,
            source_file,
            included_sheets: sheets
                .iter()
                .map(|sheet| IncludedSheet {
                    name: sheet.name.clone(),
                    row_count: sheet.rows.len(),
                    header_row: sheet.header_row_index,
                })
                .collect(),
            required_sheet_status: required_status,
            structured,
        })
    }

    async fn load_snapshot(&self, conn: &mut PgConnection, building_id: Uuid) -> Result<BuildingSnapshot, AppError> {
        let floors = self.building_repo.snapshot_floors(&mut *conn, building_id).await?;
        let tenants = self.building_repo.snapshot_tenants(&mut *conn, building_id).await?;
        let units = self.building_repo.snapshot_units(&mut *conn, building_id).await?;
        let occupancies = self.building_repo.snapshot_occupancies(&mut *conn, building_id).await?;

        Ok(BuildingSnapshot::new(floors, tenants, units, occupancies))
    }

    /// O lote pedido (ou o último) com as abas e até `row_limit` linhas por aba.
    pub async fn load_batch(
        &self,
        building_id: Uuid,
        batch_id: Option<Uuid>,
        row_limit: Option<i64>,
    ) -> Result<ImportBatchDetail, AppError> {
        if self.building_repo.find_building(building_id).await?.is_none() {
            return Err(AppError::BuildingNotFound);
        }

        let batch = self
            .source_repo
            .find_batch(building_id, batch_id)
            .await?
            .ok_or(AppError::ImportBatchNotFound)?;

        let mut source_sheets = Vec::new();
        for sheet in self.source_repo.list_sheets(batch.id).await? {
            let source_rows = self.source_repo.list_rows(sheet.id, row_limit).await?;
            source_sheets.push(SourceSheetWithRows { sheet, source_rows });
        }

        Ok(ImportBatchDetail { batch, source_sheets })
    }

    /// GET /import/source-xlsx
    pub async fn preview_batch(&self, building_id: Uuid, batch_id: Option<Uuid>) -> Result<ImportBatchDetail, AppError> {
        self.load_batch(building_id, batch_id, Some(PREVIEW_ROW_LIMIT)).await
    }
}
