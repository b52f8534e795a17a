use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::route::{CompositionState, NewRoute, Route, RouteChanges, RouteLeg};
use crate::services::route_composition_service::sequence_numbers;
use crate::utils::validation::{normalize_code, validate_not_empty, CODE_REGEX};

// Selección de un pathway y la opción a recorrer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LegSelection {
    #[validate(range(min = 1))]
    pub pathway_id: i32,
    #[validate(range(min = 1))]
    pub pathway_option_id: i32,
}

// Request para crear una ruta, opcionalmente ya compuesta
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteRequest {
    #[validate(length(max = 150), custom = "validate_not_empty")]
    pub name: String,
    #[validate(
        length(min = 1, max = 50),
        regex(path = "CODE_REGEX", code = "format", message = "code must be uppercase letters, digits, '-' or '_'")
    )]
    pub code: String,
    #[validate(range(min = 1))]
    pub busline_id: i32,
    #[validate(range(min = 1))]
    pub service_type_id: i32,
    #[validate(range(min = 1))]
    pub origin_node_id: i32,
    #[validate(range(min = 1))]
    pub destination_node_id: i32,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    #[validate]
    pub legs: Vec<LegSelection>,
}

impl CreateRouteRequest {
    pub fn normalize(&mut self) {
        self.code = normalize_code(&self.code);
        self.name = self.name.trim().to_string();
    }

    /// Separa la fila de la ruta de la selección de tramos
    pub fn into_parts(self) -> (NewRoute, Vec<LegSelection>) {
        let route = NewRoute {
            name: self.name,
            code: self.code,
            busline_id: self.busline_id,
            service_type_id: self.service_type_id,
            origin_node_id: self.origin_node_id,
            destination_node_id: self.destination_node_id,
            active: self.active,
        };
        (route, self.legs)
    }
}

// Request para actualizar una ruta (PATCH); los tramos se editan aparte
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRouteRequest {
    #[validate(length(max = 150), custom = "validate_not_empty")]
    pub name: Option<String>,
    #[validate(
        length(min = 1, max = 50),
        regex(path = "CODE_REGEX", code = "format", message = "code must be uppercase letters, digits, '-' or '_'")
    )]
    pub code: Option<String>,
    #[validate(range(min = 1))]
    pub busline_id: Option<i32>,
    #[validate(range(min = 1))]
    pub service_type_id: Option<i32>,
    #[validate(range(min = 1))]
    pub origin_node_id: Option<i32>,
    #[validate(range(min = 1))]
    pub destination_node_id: Option<i32>,
    pub active: Option<bool>,
}

impl UpdateRouteRequest {
    pub fn normalize(&mut self) {
        self.code = self.code.as_deref().map(normalize_code);
        self.name = self.name.as_deref().map(|n| n.trim().to_string());
    }

    pub fn into_changes(self) -> RouteChanges {
        RouteChanges {
            name: self.name,
            code: self.code,
            busline_id: self.busline_id,
            service_type_id: self.service_type_id,
            origin_node_id: self.origin_node_id,
            destination_node_id: self.destination_node_id,
            active: self.active,
        }
    }
}

// Request para (re)componer los tramos de una ruta
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRouteLegsRequest {
    #[validate]
    pub legs: Vec<LegSelection>,
}

/// Tramo con su número de secuencia visible
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLegResponse {
    #[serde(flatten)]
    pub leg: RouteLeg,
    pub sequence: i32,
}

pub fn leg_responses(legs: Vec<RouteLeg>) -> Vec<RouteLegResponse> {
    let sequences = sequence_numbers(&legs);
    legs.into_iter()
        .zip(sequences)
        .map(|(leg, sequence)| RouteLegResponse { leg, sequence })
        .collect()
}

// Response de ruta con sus tramos
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    #[serde(flatten)]
    pub route: Route,
    pub composition_state: CompositionState,
    pub legs: Vec<RouteLegResponse>,
}

impl RouteResponse {
    pub fn new(route: Route, legs: Vec<RouteLeg>) -> Self {
        Self {
            route,
            composition_state: CompositionState::from_leg_count(legs.len()),
            legs: leg_responses(legs),
        }
    }
}
