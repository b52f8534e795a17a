//! Modelo de Pathway
//!
//! Relación dirigida y reutilizable entre un nodo origen y un nodo destino.
//! Mapea a la tabla `pathways`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pathway {
    pub id: i32,
    pub origin_node_id: i32,
    pub destination_node_id: i32,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub is_empty_trip: bool,
    pub is_sellable: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewPathway {
    pub origin_node_id: i32,
    pub destination_node_id: i32,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub is_empty_trip: bool,
    pub is_sellable: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PathwayChanges {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub is_empty_trip: Option<bool>,
    pub is_sellable: Option<bool>,
    pub active: Option<bool>,
}

impl PathwayChanges {
    pub fn apply_to(self, pathway: &mut Pathway) {
        if let Some(name) = self.name {
            pathway.name = name;
        }
        if let Some(code) = self.code {
            pathway.code = code;
        }
        if self.description.is_some() {
            pathway.description = self.description;
        }
        if let Some(is_empty_trip) = self.is_empty_trip {
            pathway.is_empty_trip = is_empty_trip;
        }
        if let Some(is_sellable) = self.is_sellable {
            pathway.is_sellable = is_sellable;
        }
        if let Some(active) = self.active {
            pathway.active = active;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayFilters {
    pub active: Option<bool>,
    pub origin_node_id: Option<i32>,
    pub destination_node_id: Option<i32>,
    pub is_empty_trip: Option<bool>,
    pub is_sellable: Option<bool>,
}

impl PathwayFilters {
    pub fn matches(&self, pathway: &Pathway) -> bool {
        self.active.map_or(true, |v| pathway.active == v)
            && self.origin_node_id.map_or(true, |v| pathway.origin_node_id == v)
            && self
                .destination_node_id
                .map_or(true, |v| pathway.destination_node_id == v)
            && self.is_empty_trip.map_or(true, |v| pathway.is_empty_trip == v)
            && self.is_sellable.map_or(true, |v| pathway.is_sellable == v)
    }
}
