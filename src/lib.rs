//! Backend de administración de rutas de flota
//!
//! Nodos, pathways con sus opciones y casetas, y rutas compuestas por tramos
//! generados a partir de una selección ordenada de (pathway, opción).

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{middleware::from_fn_with_state, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::{auth::auth_middleware, cors::cors_layer};
use crate::state::AppState;

/// Construye el router completo de la aplicación
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/nodes", routes::node_routes::create_node_router())
        .nest("/pathways", routes::pathway_routes::create_pathway_router())
        .nest("/routes", routes::route_routes::create_route_router())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
