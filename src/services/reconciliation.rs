// src/services/reconciliation.rs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        building::{FloorRef, NewTenant, OccupancyRef, TenantRef, UnitRef},
        source_import::{RowFields, StructuredCounters},
    },
    services::{
        extraction::{normalize_tenant_name, StructuredCandidate},
        floor_layout::desired_sort_index,
    },
};

/// Área provisória das unidades criadas pela importação. A área real é
/// corrigida depois pela gestão de unidades.
pub const PLACEHOLDER_GROSS_AREA: Decimal = Decimal::ONE;

// ---
// A "Capacidade" de escrita
// ---
/// Tudo o que a importação grava passa por aqui. A implementação roda dentro
/// de uma única transação; commit/rollback é responsabilidade de quem chama.
#[async_trait]
pub trait ImportWriter: Send {
    async fn create_import_batch(
        &mut self,
        building_id: Uuid,
        source_path: &str,
        source_file: &str,
        notes: Option<&str>,
    ) -> Result<Uuid, AppError>;

    async fn create_source_sheet(&mut self, sheet: NewSourceSheet<'_>) -> Result<Uuid, AppError>;

    async fn create_source_rows(&mut self, building_id: Uuid, sheet_id: Uuid, rows: &[NewSourceRow<'_>]) -> Result<(), AppError>;

    async fn create_floor(&mut self, building_id: Uuid, label: &str, sort_index: i32) -> Result<Uuid, AppError>;

    async fn create_unit(&mut self, building_id: Uuid, floor_id: Uuid, code: &str, gross_area: Decimal) -> Result<Uuid, AppError>;

    async fn create_tenant(&mut self, building_id: Uuid, tenant: &NewTenant) -> Result<Uuid, AppError>;

    async fn create_draft_occupancy(&mut self, building_id: Uuid, tenant_id: Uuid, unit_id: Uuid) -> Result<Uuid, AppError>;
}

#[derive(Debug, Clone, Copy)]
pub struct NewSourceSheet<'a> {
    pub building_id: Uuid,
    pub import_batch_id: Uuid,
    pub name: &'a str,
    pub sheet_order: i32,
    pub columns: &'a [String],
    pub header_row: i32,
    pub row_count: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct NewSourceRow<'a> {
    pub row_index: i32,
    pub row_values: &'a [String],
    pub row_fields: &'a RowFields,
}

// ---
// Snapshot do prédio (lido uma vez, no início da transação)
// ---
/// Estado de trabalho de UMA importação. Cresce com o que a própria
/// importação cria, e morre junto com ela.
#[derive(Debug, Clone, Default)]
pub struct BuildingSnapshot {
    floors: HashMap<String, Uuid>,
    sort_indices: HashSet<i32>,
    tenants: HashMap<String, Uuid>,
    units: HashMap<(Uuid, String), Uuid>,
    occupancies: HashSet<(Uuid, Uuid)>,
}

impl BuildingSnapshot {
    pub fn new(
        floors: Vec<FloorRef>,
        tenants: Vec<TenantRef>,
        units: Vec<UnitRef>,
        occupancies: Vec<OccupancyRef>,
    ) -> Self {
        let mut snapshot = Self::default();
        for floor in floors {
            snapshot.sort_indices.insert(floor.sort_index);
            snapshot.floors.insert(floor.label, floor.id);
        }
        for tenant in tenants {
            snapshot.tenants.insert(normalize_tenant_name(&tenant.name), tenant.id);
        }
        for unit in units {
            snapshot.units.insert((unit.floor_id, unit.code), unit.id);
        }
        for occupancy in occupancies {
            snapshot.occupancies.insert((occupancy.tenant_id, occupancy.unit_id));
        }
        snapshot
    }

    /// Reserva o `desired` se estiver livre; senão max(ocupados)+1, subindo
    /// até achar um valor livre. O valor escolhido já sai reservado.
    pub fn reserve_sort_index(&mut self, desired: i32) -> i32 {
        if self.sort_indices.insert(desired) {
            return desired;
        }

        let mut candidate = self
            .sort_indices
            .iter()
            .max()
            .map_or(desired, |max| max + 1);
        while self.sort_indices.contains(&candidate) {
            candidate += 1;
        }
        self.sort_indices.insert(candidate);
        candidate
    }
}

// ---
// O motor de reconciliação
// ---
pub struct Reconciler<'w, W: ImportWriter + ?Sized> {
    writer: &'w mut W,
    building_id: Uuid,
    snapshot: BuildingSnapshot,
    counters: StructuredCounters,
}

impl<'w, W: ImportWriter + ?Sized> Reconciler<'w, W> {
    pub fn new(writer: &'w mut W, building_id: Uuid, snapshot: BuildingSnapshot) -> Self {
        Self {
            writer,
            building_id,
            snapshot,
            counters: StructuredCounters::default(),
        }
    }

    pub fn writer(&mut self) -> &mut W {
        &mut *self.writer
    }

    pub fn counters(&self) -> StructuredCounters {
        self.counters
    }

    /// Aplica uma linha. A ordem das chamadas importa: linhas seguintes
    /// enxergam o que as anteriores criaram.
    pub async fn apply(
        &mut self,
        sheet_name: &str,
        row_index: usize,
        candidate: &StructuredCandidate,
    ) -> Result<(), AppError> {
        // 1. Sem locatário, a linha não gera nada
        let Some(tenant_name) = candidate.tenant_name.as_deref() else {
            return Ok(());
        };
        self.counters.rows_with_structured_data += 1;

        // 2. Locatário
        let tenant_id = self.resolve_tenant(tenant_name, candidate, sheet_name, row_index).await?;

        // 3. Linha só de locatário
        let (Some(floor_label), Some(unit_code)) =
            (candidate.floor_label.as_deref(), candidate.unit_code.as_deref())
        else {
            return Ok(());
        };

        // 4. Andar, 5. Unidade
        let floor_id = self.resolve_floor(floor_label).await?;
        let unit_id = self.resolve_unit(floor_id, unit_code).await?;

        // 6. Ocupação em rascunho (no máximo uma por par)
        if !self.snapshot.occupancies.contains(&(tenant_id, unit_id)) {
            self.writer
                .create_draft_occupancy(self.building_id, tenant_id, unit_id)
                .await?;
            self.snapshot.occupancies.insert((tenant_id, unit_id));
            self.counters.occupancies_created += 1;
        }

        Ok(())
    }

    async fn resolve_tenant(
        &mut self,
        name: &str,
        candidate: &StructuredCandidate,
        sheet_name: &str,
        row_index: usize,
    ) -> Result<Uuid, AppError> {
        let key = normalize_tenant_name(name);
        if let Some(id) = self.snapshot.tenants.get(&key) {
            return Ok(*id);
        }

        let new_tenant = NewTenant {
            name: key.clone(),
            contact_name: candidate.contact_name.clone(),
            contact_phone: candidate.contact_phone.clone(),
            contact_email: candidate.contact_email.clone(),
            notes: Some(format!("來源：{sheet_name} #{row_index}")),
        };
        let id = self.writer.create_tenant(self.building_id, &new_tenant).await?;

        self.snapshot.tenants.insert(key, id);
        self.counters.tenants_created += 1;
        Ok(id)
    }

    async fn resolve_floor(&mut self, label: &str) -> Result<Uuid, AppError> {
        if let Some(id) = self.snapshot.floors.get(label) {
            return Ok(*id);
        }

        let sort_index = self.snapshot.reserve_sort_index(desired_sort_index(label));
        let id = self.writer.create_floor(self.building_id, label, sort_index).await?;

        tracing::debug!("Andar {} criado pela importação (sortIndex {})", label, sort_index);
        self.snapshot.floors.insert(label.to_string(), id);
        self.counters.floors_created += 1;
        Ok(id)
    }

    async fn resolve_unit(&mut self, floor_id: Uuid, code: &str) -> Result<Uuid, AppError> {
        let key = (floor_id, code.to_string());
        if let Some(id) = self.snapshot.units.get(&key) {
            return Ok(*id);
        }

        let id = self
            .writer
            .create_unit(self.building_id, floor_id, code, PLACEHOLDER_GROSS_AREA)
            .await?;

        self.snapshot.units.insert(key, id);
        self.counters.units_created += 1;
        Ok(id)
    }
}
