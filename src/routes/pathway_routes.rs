use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::controllers::pathway_controller::PathwayController;
use crate::controllers::pathway_option_controller::PathwayOptionController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::pathway_dto::{
    ActiveLegsResponse, CreatePathwayOptionRequest, CreatePathwayRequest, PathwayDetailResponse,
    PathwayOptionResponse, ReplaceTollsRequest, UpdatePathwayOptionRequest, UpdatePathwayRequest,
};
use crate::models::listing::{ListQuery, PaginatedListQuery, PaginatedResult};
use crate::models::pathway::{Pathway, PathwayFilters};
use crate::models::pathway_option::{PathwayOption, PathwayOptionFilters, Toll};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_pathway_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_pathway))
        .route("/get-pathways", post(list_pathways))
        .route("/get-pathways/paginated", post(list_pathways_paginated))
        .route(
            "/:id",
            get(get_pathway).patch(update_pathway).delete(delete_pathway),
        )
        // Opciones anidadas bajo su pathway
        .route("/:id/options", post(create_option))
        .route("/:id/options/get-options", post(list_options))
        .route(
            "/:id/options/:option_id",
            get(get_option).patch(update_option).delete(delete_option),
        )
        .route("/:id/options/:option_id/set-default", post(set_default_option))
        .route(
            "/:id/options/:option_id/tolls",
            get(list_tolls).put(replace_tolls),
        )
        .route("/:id/options/:option_id/active-legs", get(active_legs))
}

async fn create_pathway(
    State(state): State<AppState>,
    Json(request): Json<CreatePathwayRequest>,
) -> Result<Json<ApiResponse<Pathway>>, AppError> {
    let controller = PathwayController::new(state.db.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_pathway(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PathwayDetailResponse>, AppError> {
    let controller = PathwayController::new(state.db.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_pathway(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdatePathwayRequest>,
) -> Result<Json<ApiResponse<Pathway>>, AppError> {
    let controller = PathwayController::new(state.db.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_pathway(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = PathwayController::new(state.db.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message_only(
        "Pathway eliminado exitosamente".to_string(),
    )))
}

async fn list_pathways(
    State(state): State<AppState>,
    Json(query): Json<ListQuery<PathwayFilters>>,
) -> Result<Json<Vec<Pathway>>, AppError> {
    let controller = PathwayController::new(state.db.clone());
    let response = controller.list(query).await?;
    Ok(Json(response))
}

async fn list_pathways_paginated(
    State(state): State<AppState>,
    Json(query): Json<PaginatedListQuery<PathwayFilters>>,
) -> Result<Json<PaginatedResult<Pathway>>, AppError> {
    let controller = PathwayController::new(state.db.clone());
    let response = controller.list_paginated(query).await?;
    Ok(Json(response))
}

async fn create_option(
    State(state): State<AppState>,
    Path(pathway_id): Path<i32>,
    Json(request): Json<CreatePathwayOptionRequest>,
) -> Result<Json<ApiResponse<PathwayOptionResponse>>, AppError> {
    let controller = PathwayOptionController::new(state.db.clone());
    let response = controller.create(pathway_id, request).await?;
    Ok(Json(response))
}

async fn list_options(
    State(state): State<AppState>,
    Path(pathway_id): Path<i32>,
    Json(query): Json<ListQuery<PathwayOptionFilters>>,
) -> Result<Json<Vec<PathwayOption>>, AppError> {
    let controller = PathwayOptionController::new(state.db.clone());
    let response = controller.list(pathway_id, query).await?;
    Ok(Json(response))
}

async fn get_option(
    State(state): State<AppState>,
    Path((pathway_id, option_id)): Path<(i32, i32)>,
) -> Result<Json<PathwayOptionResponse>, AppError> {
    let controller = PathwayOptionController::new(state.db.clone());
    let response = controller.get_by_id(pathway_id, option_id).await?;
    Ok(Json(response))
}

async fn update_option(
    State(state): State<AppState>,
    Path((pathway_id, option_id)): Path<(i32, i32)>,
    Json(request): Json<UpdatePathwayOptionRequest>,
) -> Result<Json<ApiResponse<PathwayOptionResponse>>, AppError> {
    let controller = PathwayOptionController::new(state.db.clone());
    let response = controller.update(pathway_id, option_id, request).await?;
    Ok(Json(response))
}

async fn delete_option(
    State(state): State<AppState>,
    Path((pathway_id, option_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = PathwayOptionController::new(state.db.clone());
    controller.delete(pathway_id, option_id).await?;
    Ok(Json(ApiResponse::message_only(
        "Opción eliminada exitosamente".to_string(),
    )))
}

async fn set_default_option(
    State(state): State<AppState>,
    Path((pathway_id, option_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<PathwayOption>>, AppError> {
    let controller = PathwayOptionController::new(state.db.clone());
    let response = controller.set_default(pathway_id, option_id).await?;
    Ok(Json(response))
}

async fn list_tolls(
    State(state): State<AppState>,
    Path((pathway_id, option_id)): Path<(i32, i32)>,
) -> Result<Json<Vec<Toll>>, AppError> {
    let controller = PathwayOptionController::new(state.db.clone());
    let response = controller.list_tolls(pathway_id, option_id).await?;
    Ok(Json(response))
}

async fn replace_tolls(
    State(state): State<AppState>,
    Path((pathway_id, option_id)): Path<(i32, i32)>,
    Json(request): Json<ReplaceTollsRequest>,
) -> Result<Json<ApiResponse<Vec<Toll>>>, AppError> {
    let controller = PathwayOptionController::new(state.db.clone());
    let response = controller
        .replace_tolls(pathway_id, option_id, request)
        .await?;
    Ok(Json(response))
}

async fn active_legs(
    State(state): State<AppState>,
    Path((pathway_id, option_id)): Path<(i32, i32)>,
) -> Result<Json<ActiveLegsResponse>, AppError> {
    let controller = PathwayOptionController::new(state.db.clone());
    let response = controller.active_legs(pathway_id, option_id).await?;
    Ok(Json(response))
}
