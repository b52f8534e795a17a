use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::controllers::node_controller::NodeController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::node_dto::{CreateNodeRequest, UpdateNodeRequest};
use crate::models::listing::{ListQuery, PaginatedListQuery, PaginatedResult};
use crate::models::node::{Node, NodeFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_node_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_node))
        .route("/get-nodes", post(list_nodes))
        .route("/get-nodes/paginated", post(list_nodes_paginated))
        .route("/:id", get(get_node).patch(update_node).delete(delete_node))
}

async fn create_node(
    State(state): State<AppState>,
    Json(request): Json<CreateNodeRequest>,
) -> Result<Json<ApiResponse<Node>>, AppError> {
    let controller = NodeController::new(state.db.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Node>, AppError> {
    let controller = NodeController::new(state.db.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateNodeRequest>,
) -> Result<Json<ApiResponse<Node>>, AppError> {
    let controller = NodeController::new(state.db.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = NodeController::new(state.db.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message_only(
        "Nodo eliminado exitosamente".to_string(),
    )))
}

async fn list_nodes(
    State(state): State<AppState>,
    Json(query): Json<ListQuery<NodeFilters>>,
) -> Result<Json<Vec<Node>>, AppError> {
    let controller = NodeController::new(state.db.clone());
    let response = controller.list(query).await?;
    Ok(Json(response))
}

async fn list_nodes_paginated(
    State(state): State<AppState>,
    Json(query): Json<PaginatedListQuery<NodeFilters>>,
) -> Result<Json<PaginatedResult<Node>>, AppError> {
    let controller = NodeController::new(state.db.clone());
    let response = controller.list_paginated(query).await?;
    Ok(Json(response))
}
