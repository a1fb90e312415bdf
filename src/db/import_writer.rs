// src/db/import_writer.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BuildingRepository, SourceImportRepository},
    models::building::{NewTenant, OccupancyStatus},
    services::reconciliation::{ImportWriter, NewSourceRow, NewSourceSheet},
};

/// `ImportWriter` sobre a conexão de uma transação aberta. Nada aqui faz
/// commit: quem abriu a transação decide.
pub struct PgImportWriter<'a> {
    conn: &'a mut PgConnection,
    buildings: &'a BuildingRepository,
    sources: &'a SourceImportRepository,
}

impl<'a> PgImportWriter<'a> {
    pub fn new(
        conn: &'a mut PgConnection,
        buildings: &'a BuildingRepository,
        sources: &'a SourceImportRepository,
    ) -> Self {
        Self { conn, buildings, sources }
    }
}

#[async_trait]
impl ImportWriter for PgImportWriter<'_> {
    async fn create_import_batch(
        &mut self,
        building_id: Uuid,
        source_path: &str,
        source_file: &str,
        notes: Option<&str>,
    ) -> Result<Uuid, AppError> {
        self.sources
            .create_import_batch(&mut *self.conn, building_id, source_path, source_file, notes)
            .await
    }

    async fn create_source_sheet(&mut self, sheet: NewSourceSheet<'_>) -> Result<Uuid, AppError> {
        self.sources.create_source_sheet(&mut *self.conn, sheet).await
    }

    async fn create_source_rows(
        &mut self,
        building_id: Uuid,
        sheet_id: Uuid,
        rows: &[NewSourceRow<'_>],
    ) -> Result<(), AppError> {
        self.sources
            .create_source_rows(&mut *self.conn, building_id, sheet_id, rows)
            .await
    }

    async fn create_floor(&mut self, building_id: Uuid, label: &str, sort_index: i32) -> Result<Uuid, AppError> {
        self.buildings
            .create_floor(&mut *self.conn, building_id, label, sort_index)
            .await
    }

    async fn create_unit(
        &mut self,
        building_id: Uuid,
        floor_id: Uuid,
        code: &str,
        gross_area: Decimal,
    ) -> Result<Uuid, AppError> {
        self.buildings
            .create_unit(&mut *self.conn, building_id, floor_id, code, gross_area)
            .await
    }

    async fn create_tenant(&mut self, building_id: Uuid, tenant: &NewTenant) -> Result<Uuid, AppError> {
        self.buildings.create_tenant(&mut *self.conn, building_id, tenant).await
    }

    async fn create_draft_occupancy(
        &mut self,
        building_id: Uuid,
        tenant_id: Uuid,
        unit_id: Uuid,
    ) -> Result<Uuid, AppError> {
        self.buildings
            .create_occupancy(&mut *self.conn, building_id, tenant_id, unit_id, OccupancyStatus::Draft)
            .await
    }
}
