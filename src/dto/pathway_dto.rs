use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::pathway::{NewPathway, Pathway, PathwayChanges};
use crate::models::pathway_option::{NewToll, PathwayOption, Toll};
use crate::models::route::RouteLeg;
use crate::utils::validation::{
    normalize_code, validate_non_negative_decimal, validate_not_empty, validate_positive_decimal,
    CODE_REGEX,
};

fn default_true() -> bool {
    true
}

// Request para crear un pathway
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePathwayRequest {
    #[validate(range(min = 1))]
    pub origin_node_id: i32,
    #[validate(range(min = 1))]
    pub destination_node_id: i32,
    #[validate(length(max = 150), custom = "validate_not_empty")]
    pub name: String,
    #[validate(
        length(min = 1, max = 50),
        regex(path = "CODE_REGEX", code = "format", message = "code must be uppercase letters, digits, '-' or '_'")
    )]
    pub code: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default)]
    pub is_empty_trip: bool,
    #[serde(default = "default_true")]
    pub is_sellable: bool,
    /// Un pathway recién creado no tiene opciones, así que nace inactivo
    #[serde(default)]
    pub active: bool,
}

impl CreatePathwayRequest {
    pub fn normalize(&mut self) {
        self.code = normalize_code(&self.code);
        self.name = self.name.trim().to_string();
    }

    pub fn into_new_pathway(self) -> NewPathway {
        NewPathway {
            origin_node_id: self.origin_node_id,
            destination_node_id: self.destination_node_id,
            name: self.name,
            code: self.code,
            description: self.description,
            is_empty_trip: self.is_empty_trip,
            is_sellable: self.is_sellable,
            active: self.active,
        }
    }
}

// Request para actualizar un pathway; origen y destino no se modifican
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePathwayRequest {
    #[validate(length(max = 150), custom = "validate_not_empty")]
    pub name: Option<String>,
    #[validate(
        length(min = 1, max = 50),
        regex(path = "CODE_REGEX", code = "format", message = "code must be uppercase letters, digits, '-' or '_'")
    )]
    pub code: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub is_empty_trip: Option<bool>,
    pub is_sellable: Option<bool>,
    pub active: Option<bool>,
}

impl UpdatePathwayRequest {
    pub fn normalize(&mut self) {
        self.code = self.code.as_deref().map(normalize_code);
        self.name = self.name.as_deref().map(|n| n.trim().to_string());
    }

    pub fn into_changes(self) -> PathwayChanges {
        PathwayChanges {
            name: self.name,
            code: self.code,
            description: self.description,
            is_empty_trip: self.is_empty_trip,
            is_sellable: self.is_sellable,
            active: self.active,
        }
    }
}

/// Pathway con sus opciones no borradas
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayDetailResponse {
    #[serde(flatten)]
    pub pathway: Pathway,
    pub options: Vec<PathwayOption>,
}

// Caseta dentro de una opción
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TollInput {
    #[validate(range(min = 1))]
    pub node_id: i32,
    #[validate(range(min = 0))]
    pub pass_time_min: i32,
    #[validate(custom = "validate_non_negative_decimal")]
    pub distance: Decimal,
}

impl From<TollInput> for NewToll {
    fn from(input: TollInput) -> Self {
        NewToll {
            node_id: input.node_id,
            pass_time_min: input.pass_time_min,
            distance: input.distance,
        }
    }
}

// Request para crear una opción; el pathway viene en la ruta
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePathwayOptionRequest {
    #[validate(length(max = 150), custom = "validate_not_empty")]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom = "validate_positive_decimal")]
    pub distance_km: Decimal,
    #[validate(range(min = 1))]
    pub typical_time_min: i32,
    /// Se deriva de distancia y tiempo si no se envía
    #[validate(custom = "validate_positive_decimal")]
    pub avg_speed_kmh: Option<Decimal>,
    pub is_default: Option<bool>,
    #[serde(default)]
    pub is_pass_through: bool,
    #[validate(range(min = 1))]
    pub pass_through_time_min: Option<i32>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    #[validate]
    pub tolls: Vec<TollInput>,
}

// Request para actualizar una opción (PATCH); las casetas se reemplazan aparte
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePathwayOptionRequest {
    #[validate(length(max = 150), custom = "validate_not_empty")]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom = "validate_positive_decimal")]
    pub distance_km: Option<Decimal>,
    #[validate(range(min = 1))]
    pub typical_time_min: Option<i32>,
    #[validate(custom = "validate_positive_decimal")]
    pub avg_speed_kmh: Option<Decimal>,
    pub is_default: Option<bool>,
    pub is_pass_through: Option<bool>,
    #[validate(range(min = 1))]
    pub pass_through_time_min: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceTollsRequest {
    #[validate]
    pub tolls: Vec<TollInput>,
}

/// Opción con sus casetas en orden
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayOptionResponse {
    #[serde(flatten)]
    pub option: PathwayOption,
    pub tolls: Vec<Toll>,
}

/// Impacto de desactivar o borrar una opción
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveLegsResponse {
    pub pathway_id: i32,
    pub pathway_option_id: i32,
    pub route_ids: Vec<i32>,
    pub legs: Vec<RouteLeg>,
}

impl ActiveLegsResponse {
    pub fn new(pathway_id: i32, pathway_option_id: i32, legs: Vec<RouteLeg>) -> Self {
        let mut route_ids: Vec<i32> = legs.iter().map(|leg| leg.route_id).collect();
        route_ids.sort_unstable();
        route_ids.dedup();
        Self {
            pathway_id,
            pathway_option_id,
            route_ids,
            legs,
        }
    }
}
