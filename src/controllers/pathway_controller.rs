use std::sync::Arc;

use crate::database::{Database, UnitOfWork};
use crate::dto::common_dto::ApiResponse;
use crate::dto::pathway_dto::{CreatePathwayRequest, PathwayDetailResponse, UpdatePathwayRequest};
use crate::models::listing::{ListQuery, PaginatedListQuery, PaginatedResult, Pagination};
use crate::models::pathway::{Pathway, PathwayFilters};
use crate::repositories::{
    NodeRepository, PathwayOptionRepository, PathwayRepository, RouteLegRepository,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::field_errors::FieldErrorCollector;

pub struct PathwayController {
    db: Arc<dyn Database>,
}

const REQUIRES_OPTIONS: &str = "A pathway needs at least one option before it can be active";

impl PathwayController {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        mut request: CreatePathwayRequest,
    ) -> AppResult<ApiResponse<Pathway>> {
        request.normalize();
        let mut errors = FieldErrorCollector::from_validation(&request);

        if request.origin_node_id == request.destination_node_id {
            errors.add(
                "destinationNodeId",
                "same_as_origin",
                "destinationNodeId must differ from originNodeId",
                Some(request.destination_node_id.into()),
            );
        }
        if request.active {
            errors.add("active", "requires_options", REQUIRES_OPTIONS, None);
        }

        let mut uow = self.db.begin().await?;

        if uow.find_node(request.origin_node_id).await?.is_none() {
            errors.add_missing_reference("originNodeId", "Node", request.origin_node_id);
        }
        if request.destination_node_id != request.origin_node_id
            && uow.find_node(request.destination_node_id).await?.is_none()
        {
            errors.add_missing_reference(
                "destinationNodeId",
                "Node",
                request.destination_node_id,
            );
        }
        if !errors.has_error_on("code") {
            let taken = uow
                .find_pathway_codes_in_use(&[request.code.clone()], None)
                .await?;
            for code in taken {
                errors.add_duplicate("code", &code);
            }
        }
        errors.into_result()?;

        let pathway = uow.create_pathway(request.into_new_pathway()).await?;
        uow.commit().await?;

        tracing::info!(
            "🛣️ Pathway creado: {} ({} -> {})",
            pathway.code,
            pathway.origin_node_id,
            pathway.destination_node_id
        );
        Ok(ApiResponse::success_with_message(
            pathway,
            "Pathway creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PathwayDetailResponse> {
        let mut uow = self.db.begin().await?;
        let pathway = uow
            .find_pathway(id)
            .await?
            .ok_or_else(|| not_found_error("Pathway", id))?;
        let options = uow
            .list_pathway_options(id, &ListQuery::default())
            .await?;

        Ok(PathwayDetailResponse { pathway, options })
    }

    pub async fn update(
        &self,
        id: i32,
        mut request: UpdatePathwayRequest,
    ) -> AppResult<ApiResponse<Pathway>> {
        request.normalize();
        let mut errors = FieldErrorCollector::from_validation(&request);

        let mut uow = self.db.begin().await?;
        let current = uow
            .find_pathway(id)
            .await?
            .ok_or_else(|| not_found_error("Pathway", id))?;

        let activating = request.active == Some(true) && !current.active;
        if activating && uow.count_pathway_options(id).await? == 0 {
            errors.add("active", "requires_options", REQUIRES_OPTIONS, None);
        }
        if let Some(code) = request.code.as_ref().filter(|c| **c != current.code) {
            if !errors.has_error_on("code") {
                let taken = uow
                    .find_pathway_codes_in_use(&[code.clone()], Some(id))
                    .await?;
                for code in taken {
                    errors.add_duplicate("code", &code);
                }
            }
        }
        errors.into_result()?;

        let pathway = uow.update_pathway(id, request.into_changes()).await?;
        uow.commit().await?;

        tracing::info!("✏️ Pathway actualizado: {} (id {})", pathway.code, pathway.id);
        Ok(ApiResponse::success_with_message(
            pathway,
            "Pathway actualizado exitosamente".to_string(),
        ))
    }

    /// Borra el pathway y sus opciones, siempre que ninguna ruta activa lo use
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut uow = self.db.begin().await?;
        if uow.find_pathway(id).await?.is_none() {
            return Err(not_found_error("Pathway", id));
        }

        let legs = uow.find_active_legs_by_pathway(id).await?;
        if !legs.is_empty() {
            let mut route_ids: Vec<i32> = legs.iter().map(|leg| leg.route_id).collect();
            route_ids.sort_unstable();
            route_ids.dedup();
            return Err(AppError::Conflict(format!(
                "Pathway {} is used by active legs of routes {:?}",
                id, route_ids
            )));
        }

        let options = uow.soft_delete_pathway_options_by_pathway(id).await?;
        uow.soft_delete_pathway(id).await?;
        uow.commit().await?;

        tracing::info!("🗑️ Pathway eliminado: id {} ({} opciones)", id, options);
        Ok(())
    }

    pub async fn list(&self, query: ListQuery<PathwayFilters>) -> AppResult<Vec<Pathway>> {
        let mut uow = self.db.begin().await?;
        let (pathways, _) = uow.list_pathways(&query, None).await?;
        Ok(pathways)
    }

    pub async fn list_paginated(
        &self,
        query: PaginatedListQuery<PathwayFilters>,
    ) -> AppResult<PaginatedResult<Pathway>> {
        let page = query.page_request()?;
        let mut uow = self.db.begin().await?;
        let (data, total) = uow.list_pathways(&query.query, Some(page)).await?;
        Ok(PaginatedResult {
            data,
            pagination: Pagination::new(page, total),
        })
    }
}
