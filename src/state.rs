//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Se construye una sola vez en `main`.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::database::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub config: Arc<EnvironmentConfig>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, config: EnvironmentConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}
