//! Modelo de Route y RouteLeg
//!
//! Una ruta es una composición ordenada de tramos (legs). Los tramos no
//! tienen identidad propia entre ediciones: se regeneran completos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub busline_id: i32,
    pub service_type_id: i32,
    pub origin_node_id: i32,
    pub destination_node_id: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewRoute {
    pub name: String,
    pub code: String,
    pub busline_id: i32,
    pub service_type_id: i32,
    pub origin_node_id: i32,
    pub destination_node_id: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RouteChanges {
    pub name: Option<String>,
    pub code: Option<String>,
    pub busline_id: Option<i32>,
    pub service_type_id: Option<i32>,
    pub origin_node_id: Option<i32>,
    pub destination_node_id: Option<i32>,
    pub active: Option<bool>,
}

impl RouteChanges {
    pub fn apply_to(self, route: &mut Route) {
        if let Some(name) = self.name {
            route.name = name;
        }
        if let Some(code) = self.code {
            route.code = code;
        }
        if let Some(busline_id) = self.busline_id {
            route.busline_id = busline_id;
        }
        if let Some(service_type_id) = self.service_type_id {
            route.service_type_id = service_type_id;
        }
        if let Some(origin_node_id) = self.origin_node_id {
            route.origin_node_id = origin_node_id;
        }
        if let Some(destination_node_id) = self.destination_node_id {
            route.destination_node_id = destination_node_id;
        }
        if let Some(active) = self.active {
            route.active = active;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteFilters {
    pub active: Option<bool>,
    pub busline_id: Option<i32>,
    pub service_type_id: Option<i32>,
    pub origin_node_id: Option<i32>,
    pub destination_node_id: Option<i32>,
}

impl RouteFilters {
    pub fn matches(&self, route: &Route) -> bool {
        self.active.map_or(true, |v| route.active == v)
            && self.busline_id.map_or(true, |v| route.busline_id == v)
            && self.service_type_id.map_or(true, |v| route.service_type_id == v)
            && self.origin_node_id.map_or(true, |v| route.origin_node_id == v)
            && self
                .destination_node_id
                .map_or(true, |v| route.destination_node_id == v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub id: i32,
    pub position: i32,
    pub route_id: i32,
    pub origin_node_id: i32,
    pub destination_node_id: i32,
    pub pathway_id: i32,
    pub pathway_option_id: i32,
    pub is_derived: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Tramo a insertar; `is_derived` y `active` toman sus defaults si faltan
#[derive(Debug, Clone, PartialEq)]
pub struct NewRouteLeg {
    pub route_id: i32,
    pub position: i32,
    pub origin_node_id: i32,
    pub destination_node_id: i32,
    pub pathway_id: i32,
    pub pathway_option_id: i32,
    pub is_derived: Option<bool>,
    pub active: Option<bool>,
}

impl NewRouteLeg {
    pub fn is_derived(&self) -> bool {
        self.is_derived.unwrap_or(false)
    }

    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

/// Estado de composición de la ruta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompositionState {
    /// La ruta existe pero no tiene tramos
    Draft,
    /// Tiene tramos generados (o regenerados) desde una selección
    Composed,
}

impl CompositionState {
    pub fn from_leg_count(count: usize) -> Self {
        if count == 0 {
            CompositionState::Draft
        } else {
            CompositionState::Composed
        }
    }
}
