//! Controllers
//!
//! Reglas de negocio de cada entidad. Cada operación abre su propia unidad
//! de trabajo y solo confirma cuando todos los pasos terminaron bien.

pub mod node_controller;
pub mod pathway_controller;
pub mod pathway_option_controller;
pub mod route_controller;
