// src/db/source_import_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::source_import::{ImportBatch, SourceRow, SourceSheet},
    services::reconciliation::{NewSourceRow, NewSourceSheet},
};

// O repositório da trilha de auditoria: import_batches, source_sheets, source_rows
#[derive(Clone)]
pub struct SourceImportRepository {
    pool: PgPool,
}

impl SourceImportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Escrita" (sempre dentro da transação da importação)
    // ---

    pub async fn create_import_batch<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        source_path: &str,
        source_file: &str,
        notes: Option<&str>,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO import_batches (building_id, source_path, source_file, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(building_id)
        .bind(source_path)
        .bind(source_file)
        .bind(notes)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    pub async fn create_source_sheet<'e, E>(&self, executor: E, sheet: NewSourceSheet<'_>) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO source_sheets
                (building_id, import_batch_id, name, sheet_order, columns, header_row, row_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(sheet.building_id)
        .bind(sheet.import_batch_id)
        .bind(sheet.name)
        .bind(sheet.sheet_order)
        .bind(sheet.columns)
        .bind(sheet.header_row)
        .bind(sheet.row_count)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    /// Um único INSERT multi-valor. Quem chama já fatia as linhas.
    pub async fn create_source_rows<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        source_sheet_id: Uuid,
        rows: &[NewSourceRow<'_>],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if rows.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO source_rows (building_id, source_sheet_id, row_index, row_values, row_fields) ",
        );
        builder.push_values(rows, |mut b, row| {
            b.push_bind(building_id)
                .push_bind(source_sheet_id)
                .push_bind(row.row_index)
                .push_bind(row.row_values.to_vec())
                .push_bind(Json(row.row_fields.clone()));
        });

        builder.build().execute(executor).await?;
        Ok(())
    }

    // ---
    // Funções de "Leitura" (preview e exportação)
    // ---

    /// O lote pedido, ou o mais recente do prédio.
    pub async fn find_batch(
        &self,
        building_id: Uuid,
        batch_id: Option<Uuid>,
    ) -> Result<Option<ImportBatch>, AppError> {
        let batch = match batch_id {
            Some(batch_id) => {
                sqlx::query_as::<_, ImportBatch>(
                    "SELECT * FROM import_batches WHERE building_id = $1 AND id = $2",
                )
                .bind(building_id)
                .bind(batch_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ImportBatch>(
                    r#"
                    SELECT * FROM import_batches
                    WHERE building_id = $1
                    ORDER BY created_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(building_id)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(batch)
    }

    pub async fn list_sheets(&self, import_batch_id: Uuid) -> Result<Vec<SourceSheet>, AppError> {
        let sheets = sqlx::query_as::<_, SourceSheet>(
            "SELECT * FROM source_sheets WHERE import_batch_id = $1 ORDER BY sheet_order ASC",
        )
        .bind(import_batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sheets)
    }

    /// `limit = None` traz todas as linhas (LIMIT NULL no Postgres).
    pub async fn list_rows(&self, source_sheet_id: Uuid, limit: Option<i64>) -> Result<Vec<SourceRow>, AppError> {
        let rows = sqlx::query_as::<_, SourceRow>(
            r#"
            SELECT id, source_sheet_id, row_index, row_values, row_fields
            FROM source_rows
            WHERE source_sheet_id = $1
            ORDER BY row_index ASC
            LIMIT $2
            "#,
        )
        .bind(source_sheet_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
