//! Services module
//!
//! Lógica de negocio pura, sin acceso a base de datos: la composición de
//! rutas y las reglas de las opciones de pathway.

pub mod pathway_option_policy;
pub mod route_composition_service;
