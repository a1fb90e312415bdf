// src/db/building_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::building::{
        Building, Floor, FloorRef, FloorSpec, NewTenant, OccupancyRef, OccupancyStatus, TenantRef, UnitRef,
    },
};

#[derive(Clone)]
pub struct BuildingRepository {
    pool: PgPool,
}

impl BuildingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Prédios
    // ---

    pub async fn create_building<'e, E>(
        &self,
        executor: E,
        name: &str,
        address: Option<&str>,
    ) -> Result<Building, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building = sqlx::query_as::<_, Building>(
            r#"
            INSERT INTO buildings (name, address)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(address)
        .fetch_one(executor)
        .await?;

        Ok(building)
    }

    // Leituras simples usam a pool principal.
    pub async fn find_building(&self, building_id: Uuid) -> Result<Option<Building>, AppError> {
        let building = sqlx::query_as::<_, Building>("SELECT * FROM buildings WHERE id = $1")
            .bind(building_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(building)
    }

    // ---
    // Andares
    // ---

    pub async fn list_floors(&self, building_id: Uuid) -> Result<Vec<Floor>, AppError> {
        let floors = sqlx::query_as::<_, Floor>(
            "SELECT * FROM floors WHERE building_id = $1 ORDER BY sort_index ASC",
        )
        .bind(building_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(floors)
    }

    pub async fn delete_floors<'e, E>(&self, executor: E, building_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM floors WHERE building_id = $1")
            .bind(building_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Insere vários andares num único comando.
    pub async fn create_floors<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        specs: &[FloorSpec],
    ) -> Result<Vec<Floor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        let labels: Vec<&str> = specs.iter().map(|s| s.label.as_str()).collect();
        let indices: Vec<i32> = specs.iter().map(|s| s.sort_index).collect();

        let floors = sqlx::query_as::<_, Floor>(
            r#"
            INSERT INTO floors (building_id, label, sort_index)
            SELECT $1, label, sort_index
            FROM UNNEST($2::text[], $3::int4[]) AS t(label, sort_index)
            RETURNING *
            "#,
        )
        .bind(building_id)
        .bind(labels)
        .bind(indices)
        .fetch_all(executor)
        .await?;

        Ok(floors)
    }

    pub async fn create_floor<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        label: &str,
        sort_index: i32,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO floors (building_id, label, sort_index)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(building_id)
        .bind(label)
        .bind(sort_index)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    // ---
    // Unidades, Locatários e Ocupações (escritas da importação)
    // ---

    pub async fn create_unit<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        floor_id: Uuid,
        code: &str,
        gross_area: Decimal,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO units (building_id, floor_id, code, gross_area, is_current)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id
            "#,
        )
        .bind(building_id)
        .bind(floor_id)
        .bind(code)
        .bind(gross_area)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        tenant: &NewTenant,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO tenants (building_id, name, contact_name, contact_phone, contact_email, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(building_id)
        .bind(&tenant.name)
        .bind(tenant.contact_name.as_deref())
        .bind(tenant.contact_phone.as_deref())
        .bind(tenant.contact_email.as_deref())
        .bind(tenant.notes.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    pub async fn create_occupancy<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        tenant_id: Uuid,
        unit_id: Uuid,
        status: OccupancyStatus,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO occupancies (building_id, tenant_id, unit_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(building_id)
        .bind(tenant_id)
        .bind(unit_id)
        .bind(status)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    // ---
    // Leituras do snapshot (sempre dentro da transação da importação)
    // ---

    pub async fn snapshot_floors<'e, E>(&self, executor: E, building_id: Uuid) -> Result<Vec<FloorRef>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let floors = sqlx::query_as::<_, FloorRef>(
            "SELECT id, label, sort_index FROM floors WHERE building_id = $1",
        )
        .bind(building_id)
        .fetch_all(executor)
        .await?;

        Ok(floors)
    }

    pub async fn snapshot_tenants<'e, E>(&self, executor: E, building_id: Uuid) -> Result<Vec<TenantRef>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenants = sqlx::query_as::<_, TenantRef>("SELECT id, name FROM tenants WHERE building_id = $1")
            .bind(building_id)
            .fetch_all(executor)
            .await?;

        Ok(tenants)
    }

    /// Só as unidades correntes participam do casamento por (andar, código).
    pub async fn snapshot_units<'e, E>(&self, executor: E, building_id: Uuid) -> Result<Vec<UnitRef>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let units = sqlx::query_as::<_, UnitRef>(
            "SELECT id, floor_id, code FROM units WHERE building_id = $1 AND is_current = TRUE",
        )
        .bind(building_id)
        .fetch_all(executor)
        .await?;

        Ok(units)
    }

    /// Ocupações encerradas não contam: o par pode ganhar um rascunho novo.
    pub async fn snapshot_occupancies<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
    ) -> Result<Vec<OccupancyRef>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let occupancies = sqlx::query_as::<_, OccupancyRef>(
            r#"
            SELECT tenant_id, unit_id
            FROM occupancies
            WHERE building_id = $1 AND status = ANY($2)
            "#,
        )
        .bind(building_id)
        .bind(&OccupancyStatus::OPEN[..])
        .fetch_all(executor)
        .await?;

        Ok(occupancies)
    }
}
