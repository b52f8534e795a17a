use std::sync::Arc;

use crate::database::{Database, UnitOfWork};
use crate::dto::common_dto::ApiResponse;
use crate::dto::route_dto::{
    leg_responses, ComposeRouteLegsRequest, CreateRouteRequest, LegSelection, RouteLegResponse,
    RouteResponse, UpdateRouteRequest,
};
use crate::models::listing::{ListQuery, PaginatedListQuery, PaginatedResult, Pagination};
use crate::models::route::{Route, RouteFilters};
use crate::repositories::{
    NodeRepository, PathwayOptionRepository, PathwayRepository, RouteLegRepository,
    RouteRepository, TollRepository,
};
use crate::services::route_composition_service::{plan_route_legs, ResolvedSelection};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::field_errors::FieldErrorCollector;

const REQUIRES_LEGS: &str = "A route needs at least one leg before it can be active";

pub struct RouteController {
    db: Arc<dyn Database>,
}

/// Carga cada selección; los problemas se acumulan como `legs[i].*`
async fn resolve_selections(
    uow: &mut dyn UnitOfWork,
    selections: &[LegSelection],
    errors: &mut FieldErrorCollector,
) -> AppResult<Vec<ResolvedSelection>> {
    let mut resolved = Vec::with_capacity(selections.len());

    for (index, selection) in selections.iter().enumerate() {
        let pathway_field = format!("legs[{}].pathwayId", index);
        let option_field = format!("legs[{}].pathwayOptionId", index);
        if errors.has_error_on(&pathway_field) || errors.has_error_on(&option_field) {
            continue;
        }

        let pathway = uow.find_pathway(selection.pathway_id).await?;
        let option = uow.find_pathway_option(selection.pathway_option_id).await?;

        let (pathway, option) = match (pathway, option) {
            (Some(_), Some(option)) if !option.active => {
                errors.add(
                    option_field,
                    "inactive",
                    format!("PathwayOption {} is inactive", option.id),
                    Some(option.id.into()),
                );
                continue;
            }
            (Some(pathway), Some(option)) if option.pathway_id == pathway.id => (pathway, option),
            (Some(pathway), Some(option)) => {
                errors.add(
                    option_field,
                    "mismatch",
                    format!(
                        "PathwayOption {} does not belong to pathway {}",
                        option.id, pathway.id
                    ),
                    Some(option.id.into()),
                );
                continue;
            }
            (pathway, option) => {
                if pathway.is_none() {
                    errors.add_missing_reference(pathway_field, "Pathway", selection.pathway_id);
                }
                if option.is_none() {
                    errors.add_missing_reference(
                        option_field,
                        "PathwayOption",
                        selection.pathway_option_id,
                    );
                }
                continue;
            }
        };

        let tolls = uow.list_tolls(option.id).await?;
        resolved.push(ResolvedSelection {
            pathway,
            option,
            tolls,
        });
    }

    Ok(resolved)
}

async fn check_route_nodes(
    uow: &mut dyn UnitOfWork,
    origin_node_id: Option<i32>,
    destination_node_id: Option<i32>,
    errors: &mut FieldErrorCollector,
) -> AppResult<()> {
    for (field, node_id) in [
        ("originNodeId", origin_node_id),
        ("destinationNodeId", destination_node_id),
    ] {
        let Some(node_id) = node_id else {
            continue;
        };
        if !errors.has_error_on(field) && uow.find_node(node_id).await?.is_none() {
            errors.add_missing_reference(field, "Node", node_id);
        }
    }
    Ok(())
}

impl RouteController {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Crea la ruta y, si llega una selección, sus tramos en la misma transacción
    pub async fn create(
        &self,
        mut request: CreateRouteRequest,
    ) -> AppResult<ApiResponse<RouteResponse>> {
        request.normalize();
        let mut errors = FieldErrorCollector::from_validation(&request);
        if request.active && request.legs.is_empty() {
            errors.add("active", "requires_legs", REQUIRES_LEGS, None);
        }

        let mut uow = self.db.begin().await?;
        check_route_nodes(
            uow.as_mut(),
            Some(request.origin_node_id),
            Some(request.destination_node_id),
            &mut errors,
        )
        .await?;
        if !errors.has_error_on("code") {
            let taken = uow
                .find_route_codes_in_use(&[request.code.clone()], None)
                .await?;
            for code in taken {
                errors.add_duplicate("code", &code);
            }
        }
        let selections = resolve_selections(uow.as_mut(), &request.legs, &mut errors).await?;
        errors.into_result()?;

        let (new_route, _) = request.into_parts();
        let route = uow.create_route(new_route).await?;
        let legs = plan_route_legs(route.id, &selections)?;
        let legs = uow.create_legs(legs).await?;
        uow.commit().await?;

        tracing::info!("🚌 Ruta creada: {} (id {}, {} tramos)", route.code, route.id, legs.len());
        Ok(ApiResponse::success_with_message(
            RouteResponse::new(route, legs),
            "Ruta creada exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<RouteResponse> {
        let mut uow = self.db.begin().await?;
        let route = uow
            .find_route(id)
            .await?
            .ok_or_else(|| not_found_error("Route", id))?;
        let legs = uow.find_legs_by_route_id(id).await?;
        Ok(RouteResponse::new(route, legs))
    }

    pub async fn update(
        &self,
        id: i32,
        mut request: UpdateRouteRequest,
    ) -> AppResult<ApiResponse<RouteResponse>> {
        request.normalize();
        let mut errors = FieldErrorCollector::from_validation(&request);

        let mut uow = self.db.begin().await?;
        let current = uow
            .find_route(id)
            .await?
            .ok_or_else(|| not_found_error("Route", id))?;
        let legs = uow.find_legs_by_route_id(id).await?;

        if request.active == Some(true) && legs.is_empty() {
            errors.add("active", "requires_legs", REQUIRES_LEGS, None);
        }
        check_route_nodes(
            uow.as_mut(),
            request.origin_node_id,
            request.destination_node_id,
            &mut errors,
        )
        .await?;
        if let Some(code) = request.code.as_ref().filter(|c| **c != current.code) {
            if !errors.has_error_on("code") {
                let taken = uow
                    .find_route_codes_in_use(&[code.clone()], Some(id))
                    .await?;
                for code in taken {
                    errors.add_duplicate("code", &code);
                }
            }
        }
        errors.into_result()?;

        let route = uow.update_route(id, request.into_changes()).await?;
        uow.commit().await?;

        tracing::info!("✏️ Ruta actualizada: {} (id {})", route.code, route.id);
        Ok(ApiResponse::success_with_message(
            RouteResponse::new(route, legs),
            "Ruta actualizada exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut uow = self.db.begin().await?;
        if uow.find_route(id).await?.is_none() {
            return Err(not_found_error("Route", id));
        }

        let legs = uow.soft_delete_legs_by_route_id(id).await?;
        uow.soft_delete_route(id).await?;
        uow.commit().await?;

        tracing::info!("🗑️ Ruta eliminada: id {} ({} tramos)", id, legs);
        Ok(())
    }

    pub async fn list(&self, query: ListQuery<RouteFilters>) -> AppResult<Vec<Route>> {
        let mut uow = self.db.begin().await?;
        let (routes, _) = uow.list_routes(&query, None).await?;
        Ok(routes)
    }

    pub async fn list_paginated(
        &self,
        query: PaginatedListQuery<RouteFilters>,
    ) -> AppResult<PaginatedResult<Route>> {
        let page = query.page_request()?;
        let mut uow = self.db.begin().await?;
        let (data, total) = uow.list_routes(&query.query, Some(page)).await?;
        Ok(PaginatedResult {
            data,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn get_legs(&self, id: i32) -> AppResult<Vec<RouteLegResponse>> {
        let mut uow = self.db.begin().await?;
        if uow.find_route(id).await?.is_none() {
            return Err(not_found_error("Route", id));
        }
        let legs = uow.find_legs_by_route_id(id).await?;
        Ok(leg_responses(legs))
    }

    /// Draft -> Composed o Composed -> Composed': borra todos los tramos e
    /// inserta el conjunto nuevo en la misma transacción
    pub async fn compose_legs(
        &self,
        id: i32,
        request: ComposeRouteLegsRequest,
    ) -> AppResult<ApiResponse<RouteResponse>> {
        let mut errors = FieldErrorCollector::from_validation(&request);
        if request.legs.is_empty() {
            errors.add("legs", "required", "At least one leg selection is required", None);
        }

        let mut uow = self.db.begin().await?;
        let route = uow
            .find_route(id)
            .await?
            .ok_or_else(|| not_found_error("Route", id))?;
        let selections = resolve_selections(uow.as_mut(), &request.legs, &mut errors).await?;
        errors.into_result()?;

        let planned = plan_route_legs(id, &selections)?;
        let removed = uow.delete_legs_by_route_id(id).await?;
        let legs = uow.create_legs(planned).await?;
        uow.commit().await?;

        tracing::info!(
            "🧩 Ruta {} compuesta: {} tramos ({} reemplazados)",
            id,
            legs.len(),
            removed
        );
        Ok(ApiResponse::success_with_message(
            RouteResponse::new(route, legs),
            "Tramos de la ruta actualizados".to_string(),
        ))
    }

    /// Regresa la ruta a Draft; no se permite mientras esté activa
    pub async fn clear_legs(&self, id: i32) -> AppResult<ApiResponse<RouteResponse>> {
        let mut uow = self.db.begin().await?;
        let route = uow
            .find_route(id)
            .await?
            .ok_or_else(|| not_found_error("Route", id))?;
        if route.active {
            return Err(AppError::Conflict(format!(
                "Route {} is active; deactivate it before clearing its legs",
                id
            )));
        }

        let removed = uow.delete_legs_by_route_id(id).await?;
        uow.commit().await?;

        tracing::info!("🧹 Ruta {}: {} tramos eliminados", id, removed);
        Ok(ApiResponse::success_with_message(
            RouteResponse::new(route, Vec::new()),
            "Tramos de la ruta eliminados".to_string(),
        ))
    }
}
