use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::controllers::route_controller::RouteController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::route_dto::{
    ComposeRouteLegsRequest, CreateRouteRequest, RouteLegResponse, RouteResponse,
    UpdateRouteRequest,
};
use crate::models::listing::{ListQuery, PaginatedListQuery, PaginatedResult};
use crate::models::route::{Route, RouteFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_route))
        .route("/get-routes", post(list_routes))
        .route("/get-routes/paginated", post(list_routes_paginated))
        .route("/:id", get(get_route).patch(update_route).delete(delete_route))
        .route(
            "/:id/legs",
            get(get_route_legs).put(compose_route_legs).delete(clear_route_legs),
        )
}

async fn create_route(
    State(state): State<AppState>,
    Json(request): Json<CreateRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.db.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RouteResponse>, AppError> {
    let controller = RouteController::new(state.db.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.db.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = RouteController::new(state.db.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message_only(
        "Ruta eliminada exitosamente".to_string(),
    )))
}

async fn list_routes(
    State(state): State<AppState>,
    Json(query): Json<ListQuery<RouteFilters>>,
) -> Result<Json<Vec<Route>>, AppError> {
    let controller = RouteController::new(state.db.clone());
    let response = controller.list(query).await?;
    Ok(Json(response))
}

async fn list_routes_paginated(
    State(state): State<AppState>,
    Json(query): Json<PaginatedListQuery<RouteFilters>>,
) -> Result<Json<PaginatedResult<Route>>, AppError> {
    let controller = RouteController::new(state.db.clone());
    let response = controller.list_paginated(query).await?;
    Ok(Json(response))
}

async fn get_route_legs(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<RouteLegResponse>>, AppError> {
    let controller = RouteController::new(state.db.clone());
    let response = controller.get_legs(id).await?;
    Ok(Json(response))
}

async fn compose_route_legs(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ComposeRouteLegsRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.db.clone());
    let response = controller.compose_legs(id, request).await?;
    Ok(Json(response))
}

async fn clear_route_legs(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.db.clone());
    let response = controller.clear_legs(id).await?;
    Ok(Json(response))
}
