use std::sync::Arc;

use serde_json::Value;

use crate::database::{Database, UnitOfWork};
use crate::dto::common_dto::ApiResponse;
use crate::dto::node_dto::{CreateNodeRequest, UpdateNodeRequest};
use crate::models::listing::{ListQuery, PaginatedListQuery, PaginatedResult, Pagination};
use crate::models::node::{Node, NodeFilters};
use crate::repositories::{NodeRepository, PathwayRepository, RouteRepository, TollRepository};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::field_errors::FieldErrorCollector;
use crate::utils::validation::validate_coordinates;

pub struct NodeController {
    db: Arc<dyn Database>,
}

fn check_coordinates(errors: &mut FieldErrorCollector, latitude: f64, longitude: f64) {
    if let Err(error) = validate_coordinates(latitude, longitude) {
        let value = error.params.get("value").cloned().unwrap_or(Value::Null);
        let range = error
            .params
            .get("range")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        errors.add(
            error.code.to_string(),
            "range",
            format!("{} must be in {}", error.code, range),
            Some(value),
        );
    }
}

impl NodeController {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, mut request: CreateNodeRequest) -> AppResult<ApiResponse<Node>> {
        request.normalize();
        let mut errors = FieldErrorCollector::from_validation(&request);
        check_coordinates(&mut errors, request.latitude, request.longitude);

        let mut uow = self.db.begin().await?;

        // Unicidad contra nodos no borrados
        if !errors.has_error_on("code") {
            let taken = uow
                .find_node_codes_in_use(&[request.code.clone()], None)
                .await?;
            for code in taken {
                errors.add_duplicate("code", &code);
            }
        }
        errors.into_result()?;

        let node = uow.create_node(request.into_new_node()).await?;
        uow.commit().await?;

        tracing::info!("📍 Nodo creado: {} (id {})", node.code, node.id);
        Ok(ApiResponse::success_with_message(
            node,
            "Nodo creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Node> {
        let mut uow = self.db.begin().await?;
        uow.find_node(id)
            .await?
            .ok_or_else(|| not_found_error("Node", id))
    }

    pub async fn update(
        &self,
        id: i32,
        mut request: UpdateNodeRequest,
    ) -> AppResult<ApiResponse<Node>> {
        request.normalize();
        let mut errors = FieldErrorCollector::from_validation(&request);

        let mut uow = self.db.begin().await?;
        let current = uow
            .find_node(id)
            .await?
            .ok_or_else(|| not_found_error("Node", id))?;

        check_coordinates(
            &mut errors,
            request.latitude.unwrap_or(current.latitude),
            request.longitude.unwrap_or(current.longitude),
        );

        if let Some(code) = request.code.as_ref().filter(|c| **c != current.code) {
            if !errors.has_error_on("code") {
                let taken = uow.find_node_codes_in_use(&[code.clone()], Some(id)).await?;
                for code in taken {
                    errors.add_duplicate("code", &code);
                }
            }
        }
        errors.into_result()?;

        let node = uow.update_node(id, request.into_changes()).await?;
        uow.commit().await?;

        tracing::info!("✏️ Nodo actualizado: {} (id {})", node.code, node.id);
        Ok(ApiResponse::success_with_message(
            node,
            "Nodo actualizado exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut uow = self.db.begin().await?;
        if uow.find_node(id).await?.is_none() {
            return Err(not_found_error("Node", id));
        }

        let pathways = uow.count_pathways_using_node(id).await?;
        let routes = uow.count_routes_using_node(id).await?;
        let tolls = uow.count_tolls_using_node(id).await?;
        if pathways > 0 || routes > 0 || tolls > 0 {
            return Err(AppError::Conflict(format!(
                "Node {} is still referenced by {} pathway(s), {} route(s) and {} toll(s)",
                id, pathways, routes, tolls
            )));
        }

        uow.soft_delete_node(id).await?;
        uow.commit().await?;

        tracing::info!("🗑️ Nodo eliminado: id {}", id);
        Ok(())
    }

    pub async fn list(&self, query: ListQuery<NodeFilters>) -> AppResult<Vec<Node>> {
        let mut uow = self.db.begin().await?;
        let (nodes, _) = uow.list_nodes(&query, None).await?;
        Ok(nodes)
    }

    pub async fn list_paginated(
        &self,
        query: PaginatedListQuery<NodeFilters>,
    ) -> AppResult<PaginatedResult<Node>> {
        let page = query.page_request()?;
        let mut uow = self.db.begin().await?;
        let (data, total) = uow.list_nodes(&query.query, Some(page)).await?;
        Ok(PaginatedResult {
            data,
            pagination: Pagination::new(page, total),
        })
    }
}
