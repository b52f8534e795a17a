//! Modelo de PathwayOption y Toll
//!
//! Una opción es una alternativa concreta (carretera, tiempo) de un pathway.
//! Las casetas (tolls) cuelgan de la opción y se ordenan por inserción.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PathwayOption {
    pub id: i32,
    pub pathway_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub distance_km: Decimal,
    pub typical_time_min: i32,
    pub avg_speed_kmh: Decimal,
    pub is_default: bool,
    pub is_pass_through: bool,
    pub pass_through_time_min: Option<i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewPathwayOption {
    pub pathway_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub distance_km: Decimal,
    pub typical_time_min: i32,
    pub avg_speed_kmh: Decimal,
    pub is_default: bool,
    pub is_pass_through: bool,
    pub pass_through_time_min: Option<i32>,
    pub active: bool,
}

/// Cambios ya resueltos contra la fila actual.
///
/// `pass_through_time_min` se escribe siempre porque la política de
/// pass-through puede anularlo aunque el cliente no lo envíe.
#[derive(Debug, Clone)]
pub struct PathwayOptionChanges {
    pub name: String,
    pub description: Option<String>,
    pub distance_km: Decimal,
    pub typical_time_min: i32,
    pub avg_speed_kmh: Decimal,
    pub is_default: bool,
    pub is_pass_through: bool,
    pub pass_through_time_min: Option<i32>,
    pub active: bool,
}

impl PathwayOptionChanges {
    pub fn apply_to(self, option: &mut PathwayOption) {
        option.name = self.name;
        option.description = self.description;
        option.distance_km = self.distance_km;
        option.typical_time_min = self.typical_time_min;
        option.avg_speed_kmh = self.avg_speed_kmh;
        option.is_default = self.is_default;
        option.is_pass_through = self.is_pass_through;
        option.pass_through_time_min = self.pass_through_time_min;
        option.active = self.active;
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayOptionFilters {
    pub active: Option<bool>,
    pub is_default: Option<bool>,
}

impl PathwayOptionFilters {
    pub fn matches(&self, option: &PathwayOption) -> bool {
        self.active.map_or(true, |v| option.active == v)
            && self.is_default.map_or(true, |v| option.is_default == v)
    }
}

/// Caseta de peaje asociada a una opción
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Toll {
    pub id: i32,
    pub pathway_option_id: i32,
    pub node_id: i32,
    pub pass_time_min: i32,
    pub distance: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewToll {
    pub node_id: i32,
    pub pass_time_min: i32,
    pub distance: Decimal,
}
