//! Modelo de Node
//!
//! Paradas y terminales físicas. Mapea a la tabla `nodes`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub allows_boarding: bool,
    pub allows_alighting: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Datos ya validados para insertar un nodo
#[derive(Debug, Clone)]
pub struct NewNode {
    pub code: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub allows_boarding: bool,
    pub allows_alighting: bool,
    pub active: bool,
}

/// Cambios parciales; `None` conserva el valor actual
#[derive(Debug, Clone, Default)]
pub struct NodeChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub allows_boarding: Option<bool>,
    pub allows_alighting: Option<bool>,
    pub active: Option<bool>,
}

impl NodeChanges {
    pub fn apply_to(self, node: &mut Node) {
        if let Some(code) = self.code {
            node.code = code;
        }
        if let Some(name) = self.name {
            node.name = name;
        }
        if let Some(latitude) = self.latitude {
            node.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            node.longitude = longitude;
        }
        if let Some(allows_boarding) = self.allows_boarding {
            node.allows_boarding = allows_boarding;
        }
        if let Some(allows_alighting) = self.allows_alighting {
            node.allows_alighting = allows_alighting;
        }
        if let Some(active) = self.active {
            node.active = active;
        }
    }
}

/// Filtros para búsqueda de nodos
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFilters {
    pub active: Option<bool>,
    pub allows_boarding: Option<bool>,
    pub allows_alighting: Option<bool>,
}

impl NodeFilters {
    pub fn matches(&self, node: &Node) -> bool {
        self.active.map_or(true, |v| node.active == v)
            && self.allows_boarding.map_or(true, |v| node.allows_boarding == v)
            && self.allows_alighting.map_or(true, |v| node.allows_alighting == v)
    }
}
