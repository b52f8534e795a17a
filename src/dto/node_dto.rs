use serde::Deserialize;
use validator::Validate;

use crate::models::node::{NewNode, NodeChanges};
use crate::utils::validation::{normalize_code, validate_not_empty, CODE_REGEX};

fn default_true() -> bool {
    true
}

// Request para crear un nodo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    #[validate(
        length(min = 1, max = 50),
        regex(path = "CODE_REGEX", code = "format", message = "code must be uppercase letters, digits, '-' or '_'")
    )]
    pub code: String,
    #[validate(length(max = 150), custom = "validate_not_empty")]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_true")]
    pub allows_boarding: bool,
    #[serde(default = "default_true")]
    pub allows_alighting: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl CreateNodeRequest {
    pub fn normalize(&mut self) {
        self.code = normalize_code(&self.code);
        self.name = self.name.trim().to_string();
    }

    pub fn into_new_node(self) -> NewNode {
        NewNode {
            code: self.code,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            allows_boarding: self.allows_boarding,
            allows_alighting: self.allows_alighting,
            active: self.active,
        }
    }
}

// Request para actualizar un nodo (PATCH)
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeRequest {
    #[validate(
        length(min = 1, max = 50),
        regex(path = "CODE_REGEX", code = "format", message = "code must be uppercase letters, digits, '-' or '_'")
    )]
    pub code: Option<String>,
    #[validate(length(max = 150), custom = "validate_not_empty")]
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub allows_boarding: Option<bool>,
    pub allows_alighting: Option<bool>,
    pub active: Option<bool>,
}

impl UpdateNodeRequest {
    pub fn normalize(&mut self) {
        self.code = self.code.as_deref().map(normalize_code);
        self.name = self.name.as_deref().map(|n| n.trim().to_string());
    }

    pub fn into_changes(self) -> NodeChanges {
        NodeChanges {
            code: self.code,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            allows_boarding: self.allows_boarding,
            allows_alighting: self.allows_alighting,
            active: self.active,
        }
    }
}
