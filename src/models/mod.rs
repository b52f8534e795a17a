//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean a las tablas
//! PostgreSQL del dominio de rutas.

pub mod listing;
pub mod node;
pub mod pathway;
pub mod pathway_option;
pub mod route;
