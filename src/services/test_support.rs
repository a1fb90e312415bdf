// src/services/test_support.rs
//
// Utilitários de teste: um "banco" em memória com transação de verdade
// (begin / commit / drop = rollback) e injeção de falha.

use anyhow::anyhow;
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        building::{FloorRef, NewTenant, OccupancyRef, TenantRef, UnitRef},
        source_import::RowFields,
    },
    services::{
        extraction::StructuredCandidate,
        reconciliation::{BuildingSnapshot, ImportWriter, NewSourceRow, NewSourceSheet},
    },
};

#[derive(Debug, Clone)]
pub struct MemFloor {
    pub id: Uuid,
    pub building_id: Uuid,
    pub label: String,
    pub sort_index: i32,
}

#[derive(Debug, Clone)]
pub struct MemUnit {
    pub id: Uuid,
    pub building_id: Uuid,
    pub floor_id: Uuid,
    pub code: String,
    pub gross_area: Decimal,
}

#[derive(Debug, Clone)]
pub struct MemTenant {
    pub id: Uuid,
    pub building_id: Uuid,
    pub tenant: NewTenant,
}

#[derive(Debug, Clone)]
pub struct MemOccupancy {
    pub building_id: Uuid,
    pub tenant_id: Uuid,
    pub unit_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct MemSheet {
    pub id: Uuid,
    pub import_batch_id: Uuid,
    pub name: String,
    pub sheet_order: i32,
    pub columns: Vec<String>,
    pub header_row: i32,
    pub row_count: i32,
}

#[derive(Debug, Clone)]
pub struct MemRow {
    pub sheet_id: Uuid,
    pub row_index: i32,
    pub row_values: Vec<String>,
    pub row_fields: RowFields,
}

#[derive(Debug, Clone, Default)]
pub struct MemState {
    pub batches: Vec<(Uuid, Uuid)>, // (batch, prédio)
    pub sheets: Vec<MemSheet>,
    pub rows: Vec<MemRow>,
    pub floors: Vec<MemFloor>,
    pub units: Vec<MemUnit>,
    pub tenants: Vec<MemTenant>,
    pub occupancies: Vec<MemOccupancy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityCounts {
    pub floors: usize,
    pub units: usize,
    pub tenants: usize,
    pub occupancies: usize,
}

/// Estado "commitado".
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub committed: MemState,
}

/// Uma transação: trabalha numa cópia e só publica no `commit`.
pub struct MemoryTx {
    pub staged: MemState,
    fail_after_entity_writes: Option<usize>,
    entity_writes: usize,
}

impl MemoryStore {
    pub fn begin(&self) -> MemoryTx {
        MemoryTx {
            staged: self.committed.clone(),
            fail_after_entity_writes: None,
            entity_writes: 0,
        }
    }

    /// As primeiras `n` criações de entidade funcionam; a seguinte falha.
    pub fn begin_failing_after(&self, n: usize) -> MemoryTx {
        MemoryTx {
            fail_after_entity_writes: Some(n),
            ..self.begin()
        }
    }

    pub fn commit(&mut self, tx: MemoryTx) {
        self.committed = tx.staged;
    }

    pub fn snapshot(&self, building_id: Uuid) -> BuildingSnapshot {
        let state = &self.committed;
        BuildingSnapshot::new(
            state
                .floors
                .iter()
                .filter(|f| f.building_id == building_id)
                .map(|f| FloorRef { id: f.id, label: f.label.clone(), sort_index: f.sort_index })
                .collect(),
            state
                .tenants
                .iter()
                .filter(|t| t.building_id == building_id)
                .map(|t| TenantRef { id: t.id, name: t.tenant.name.clone() })
                .collect(),
            state
                .units
                .iter()
                .filter(|u| u.building_id == building_id)
                .map(|u| UnitRef { id: u.id, floor_id: u.floor_id, code: u.code.clone() })
                .collect(),
            state
                .occupancies
                .iter()
                .filter(|o| o.building_id == building_id)
                .map(|o| OccupancyRef { tenant_id: o.tenant_id, unit_id: o.unit_id })
                .collect(),
        )
    }

    pub fn counts(&self, building_id: Uuid) -> EntityCounts {
        let state = &self.committed;
        EntityCounts {
            floors: state.floors.iter().filter(|f| f.building_id == building_id).count(),
            units: state.units.iter().filter(|u| u.building_id == building_id).count(),
            tenants: state.tenants.iter().filter(|t| t.building_id == building_id).count(),
            occupancies: state.occupancies.iter().filter(|o| o.building_id == building_id).count(),
        }
    }

    pub fn floor_sort_index(&self, building_id: Uuid, label: &str) -> Option<i32> {
        self.committed
            .floors
            .iter()
            .find(|f| f.building_id == building_id && f.label == label)
            .map(|f| f.sort_index)
    }

    pub fn tenant_named(&self, building_id: Uuid, name: &str) -> Option<NewTenant> {
        self.committed
            .tenants
            .iter()
            .find(|t| t.building_id == building_id && t.tenant.name == name)
            .map(|t| t.tenant.clone())
    }

    pub fn unit_gross_area(&self, building_id: Uuid, code: &str) -> Option<Decimal> {
        self.committed
            .units
            .iter()
            .find(|u| u.building_id == building_id && u.code == code)
            .map(|u| u.gross_area)
    }

    // --- Sementes (dados "pré-existentes") ---

    pub fn seed_floor(&mut self, building_id: Uuid, label: &str, sort_index: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.committed.floors.push(MemFloor { id, building_id, label: label.into(), sort_index });
        id
    }

    pub fn seed_unit(&mut self, building_id: Uuid, floor_id: Uuid, code: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.committed.units.push(MemUnit {
            id,
            building_id,
            floor_id,
            code: code.into(),
            gross_area: Decimal::new(4250, 2),
        });
        id
    }

    pub fn seed_tenant(&mut self, building_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.committed.tenants.push(MemTenant {
            id,
            building_id,
            tenant: NewTenant { name: name.into(), ..Default::default() },
        });
        id
    }

    pub fn seed_occupancy(&mut self, building_id: Uuid, tenant_id: Uuid, unit_id: Uuid) {
        self.committed.occupancies.push(MemOccupancy { building_id, tenant_id, unit_id });
    }
}

impl MemoryTx {
    fn count_entity_write(&mut self) -> Result<(), AppError> {
        if let Some(limit) = self.fail_after_entity_writes {
            if self.entity_writes >= limit {
                return Err(AppError::InternalServerError(anyhow!("falha simulada de persistência")));
            }
        }
        self.entity_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl ImportWriter for MemoryTx {
    async fn create_import_batch(
        &mut self,
        building_id: Uuid,
        _source_path: &str,
        _source_file: &str,
        _notes: Option<&str>,
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.staged.batches.push((id, building_id));
        Ok(id)
    }

    async fn create_source_sheet(&mut self, sheet: NewSourceSheet<'_>) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.staged.sheets.push(MemSheet {
            id,
            import_batch_id: sheet.import_batch_id,
            name: sheet.name.to_string(),
            sheet_order: sheet.sheet_order,
            columns: sheet.columns.to_vec(),
            header_row: sheet.header_row,
            row_count: sheet.row_count,
        });
        Ok(id)
    }

    async fn create_source_rows(
        &mut self,
        _building_id: Uuid,
        sheet_id: Uuid,
        rows: &[NewSourceRow<'_>],
    ) -> Result<(), AppError> {
        self.staged.rows.extend(rows.iter().map(|row| MemRow {
            sheet_id,
            row_index: row.row_index,
            row_values: row.row_values.to_vec(),
            row_fields: row.row_fields.clone(),
        }));
        Ok(())
    }

    async fn create_floor(&mut self, building_id: Uuid, label: &str, sort_index: i32) -> Result<Uuid, AppError> {
        self.count_entity_write()?;
        // mesmas restrições únicas do banco
        if self.staged.floors.iter().any(|f| {
            f.building_id == building_id && (f.label == label || f.sort_index == sort_index)
        }) {
            return Err(AppError::InternalServerError(anyhow!("floors: violação de unicidade")));
        }
        let id = Uuid::new_v4();
        self.staged.floors.push(MemFloor { id, building_id, label: label.into(), sort_index });
        Ok(id)
    }

    async fn create_unit(
        &mut self,
        building_id: Uuid,
        floor_id: Uuid,
        code: &str,
        gross_area: Decimal,
    ) -> Result<Uuid, AppError> {
        self.count_entity_write()?;
        let id = Uuid::new_v4();
        self.staged.units.push(MemUnit { id, building_id, floor_id, code: code.into(), gross_area });
        Ok(id)
    }

    async fn create_tenant(&mut self, building_id: Uuid, tenant: &NewTenant) -> Result<Uuid, AppError> {
        self.count_entity_write()?;
        let id = Uuid::new_v4();
        self.staged.tenants.push(MemTenant { id, building_id, tenant: tenant.clone() });
        Ok(id)
    }

    async fn create_draft_occupancy(
        &mut self,
        building_id: Uuid,
        tenant_id: Uuid,
        unit_id: Uuid,
    ) -> Result<Uuid, AppError> {
        self.count_entity_write()?;
        self.staged.occupancies.push(MemOccupancy { building_id, tenant_id, unit_id });
        Ok(Uuid::new_v4())
    }
}

/// Candidato com locatário, andar e unidade.
pub fn candidate(tenant: &str, floor: Option<&str>, unit: Option<&str>) -> StructuredCandidate {
    StructuredCandidate {
        tenant_name: Some(tenant.to_string()),
        floor_label: floor.map(str::to_string),
        unit_code: unit.map(str::to_string),
        ..Default::default()
    }
}
