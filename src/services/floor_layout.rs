// src/services/floor_layout.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{common::error::AppError, models::building::FloorSpec};

/// Ordem usada para rótulos fora da convenção B*/N*F.
pub const UNKNOWN_FLOOR_SORT_INDEX: i32 = 999;

static BASEMENT_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^B([0-9]+)$").expect("regex válida"));
static ABOVE_GROUND_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)F$").expect("regex válida"));

/// "B3" -> -3, "12F" -> 12. Qualquer outra coisa é erro.
pub fn floor_label_to_sort_index(label: &str) -> Result<i32, AppError> {
    let normalized = label.trim().to_uppercase();
    let invalid = || AppError::InvalidFloorLabel(label.to_string());

    if let Some(caps) = BASEMENT_LABEL_RE.captures(&normalized) {
        let n: i32 = caps[1].parse().map_err(|_| invalid())?;
        return Ok(-n);
    }
    if let Some(caps) = ABOVE_GROUND_LABEL_RE.captures(&normalized) {
        return caps[1].parse().map_err(|_| invalid());
    }
    Err(invalid())
}

/// Versão tolerante usada pela importação.
pub fn desired_sort_index(label: &str) -> i32 {
    floor_label_to_sort_index(label).unwrap_or(UNKNOWN_FLOOR_SORT_INDEX)
}

/// B{n}..B1 e depois 1F..{m}F.
pub fn generate_floor_specs(basement_floors: u32, above_ground_floors: u32) -> Vec<FloorSpec> {
    let basement = (1..=basement_floors as i32).rev().map(|i| FloorSpec {
        label: format!("B{i}"),
        sort_index: -i,
    });
    let above = (1..=above_ground_floors as i32).map(|i| FloorSpec {
        label: format!("{i}F"),
        sort_index: i,
    });
    basement.chain(above).collect()
}
