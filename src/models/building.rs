// src/models/building.rs

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgHasArrayType, PgTypeInfo},
    FromRow,
};
use uuid::Uuid;
use validator::Validate;

// --- 1. Prédio (o escopo de tudo) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Andar ---
// (building_id, label) e (building_id, sort_index) são únicos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: Uuid,
    pub building_id: Uuid,
    pub label: String,     // ex: "B2", "5F"
    pub sort_index: i32,   // negativo = subsolo
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 3. Ocupação (locatário x unidade) ---
// Unidades, locatários e ocupações só são escritos pela importação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "occupancy_status", rename_all = "SCREAMING_SNAKE_CASE", no_pg_array)] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum OccupancyStatus {
    Draft,  // Vira "DRAFT"
    Active, // Vira "ACTIVE"
}

impl OccupancyStatus {
    /// Ocupações que ainda seguram o par (locatário, unidade).
    /// 'ENDED' existe no banco, mas só é gravado fora da importação.
    pub const OPEN: [OccupancyStatus; 2] = [OccupancyStatus::Draft, OccupancyStatus::Active];
}

// Permite `status = ANY($n)` com um slice de status.
impl PgHasArrayType for OccupancyStatus {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_occupancy_status")
    }
}

// ---
// Projeções mínimas usadas pelo snapshot da importação
// ---

#[derive(Debug, Clone, FromRow)]
pub struct FloorRef {
    pub id: Uuid,
    pub label: String,
    pub sort_index: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct TenantRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UnitRef {
    pub id: Uuid,
    pub floor_id: Uuid,
    pub code: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct OccupancyRef {
    pub tenant_id: Uuid,
    pub unit_id: Uuid,
}

/// Dados de um locatário novo vindo da planilha.
#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub notes: Option<String>,
}

/// Um andar a ser criado pela geração regular (B*/N*F).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorSpec {
    pub label: String,
    pub sort_index: i32,
}

// ---
// Payloads
// ---
fn default_basement_floors() -> u32 {
    5
}

fn default_above_ground_floors() -> u32 {
    20
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFloorsPayload {
    #[serde(default = "default_basement_floors")]
    #[validate(range(max = 20, message = "O número de subsolos deve estar entre 0 e 20."))]
    pub basement_floors: u32,

    #[serde(default = "default_above_ground_floors")]
    #[validate(range(min = 1, max = 200, message = "O número de andares deve estar entre 1 e 200."))]
    pub above_ground_floors: u32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingPayload {
    #[validate(length(min = 1, max = 200, message = "O nome do prédio é obrigatório."))]
    pub name: String,

    #[validate(length(max = 500, message = "O endereço deve ter no máximo 500 caracteres."))]
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_occupancy_statuses_use_database_names() {
        let text = serde_json::to_string(&OccupancyStatus::OPEN).unwrap();
        assert_eq!(text, r#"["DRAFT","ACTIVE"]"#);
    }

    #[test]
    fn floor_generation_payload_applies_defaults_and_bounds() {
        let payload: GenerateFloorsPayload = serde_json::from_str("{}").unwrap();
        assert_eq!((payload.basement_floors, payload.above_ground_floors), (5, 20));
        assert!(payload.validate().is_ok());

        let too_many: GenerateFloorsPayload =
            serde_json::from_str(r#"{"basementFloors": 21, "aboveGroundFloors": 0}"#).unwrap();
        let errors = too_many.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("basement_floors"));
        assert!(fields.contains_key("above_ground_floors"));
    }

    #[test]
    fn building_name_is_required() {
        let payload: CreateBuildingPayload = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(payload.validate().is_err());
    }
}
