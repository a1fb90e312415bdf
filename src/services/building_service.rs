// src/services/building_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::BuildingRepository,
    models::building::{Building, Floor},
    services::floor_layout::generate_floor_specs,
};

#[derive(Clone)]
pub struct BuildingService {
    pool: PgPool,
    building_repo: BuildingRepository,
}

impl BuildingService {
    pub fn new(pool: PgPool, building_repo: BuildingRepository) -> Self {
        Self { pool, building_repo }
    }

    // --- PRÉDIOS ---

    pub async fn create_building(&self, name: &str, address: Option<&str>) -> Result<Building, AppError> {
        let building = self
            .building_repo
            .create_building(&self.pool, name.trim(), address.map(str::trim).filter(|a| !a.is_empty()))
            .await?;

        tracing::info!("🏢 Prédio '{}' criado ({})", building.name, building.id);
        Ok(building)
    }

    pub async fn get_building(&self, building_id: Uuid) -> Result<Building, AppError> {
        self.building_repo
            .find_building(building_id)
            .await?
            .ok_or(AppError::BuildingNotFound)
    }

    // --- ANDARES ---

    pub async fn list_floors(&self, building_id: Uuid) -> Result<Vec<Floor>, AppError> {
        self.get_building(building_id).await?;
        self.building_repo.list_floors(building_id).await
    }

    /// Apaga os andares do prédio e cria B{n}..B1, 1F..{m}F numa transação só.
    pub async fn generate_floors(
        &self,
        building_id: Uuid,
        basement_floors: u32,
        above_ground_floors: u32,
    ) -> Result<Vec<Floor>, AppError> {
        self.get_building(building_id).await?;
        let specs = generate_floor_specs(basement_floors, above_ground_floors);

        let mut tx = self.pool.begin().await?;
        let removed = self.building_repo.delete_floors(&mut *tx, building_id).await?;
        let mut floors = self.building_repo.create_floors(&mut *tx, building_id, &specs).await?;
        tx.commit().await?;

        floors.sort_by_key(|floor| floor.sort_index);
        tracing::info!(
            "🏗️ Prédio {}: {} andares removidos, {} gerados",
            building_id,
            removed,
            floors.len()
        );
        Ok(floors)
    }
}
