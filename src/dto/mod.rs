//! DTOs de la API
//!
//! Requests con sus reglas de `validator` y responses compuestas.

pub mod common_dto;
pub mod node_dto;
pub mod pathway_dto;
pub mod route_dto;
