use std::sync::Arc;

use crate::database::{Database, UnitOfWork};
use crate::dto::common_dto::ApiResponse;
use crate::dto::pathway_dto::{
    ActiveLegsResponse, CreatePathwayOptionRequest, PathwayOptionResponse, ReplaceTollsRequest,
    TollInput, UpdatePathwayOptionRequest,
};
use crate::models::listing::ListQuery;
use crate::models::pathway::Pathway;
use crate::models::pathway_option::{
    NewPathwayOption, NewToll, PathwayOption, PathwayOptionChanges, PathwayOptionFilters, Toll,
};
use crate::repositories::{
    NodeRepository, PathwayOptionRepository, PathwayRepository, RouteLegRepository,
    TollRepository,
};
use crate::services::pathway_option_policy::{derive_avg_speed, normalize_pass_through};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::field_errors::FieldErrorCollector;

pub struct PathwayOptionController {
    db: Arc<dyn Database>,
}

/// Carga pathway y opción; 404 si la opción no pertenece al pathway
async fn find_option_in(
    uow: &mut dyn UnitOfWork,
    pathway_id: i32,
    option_id: i32,
) -> AppResult<(Pathway, PathwayOption)> {
    let pathway = uow
        .find_pathway(pathway_id)
        .await?
        .ok_or_else(|| not_found_error("Pathway", pathway_id))?;
    let option = uow
        .find_pathway_option(option_id)
        .await?
        .filter(|o| o.pathway_id == pathway_id)
        .ok_or_else(|| not_found_error("PathwayOption", option_id))?;
    Ok((pathway, option))
}

/// Conflicto si algún tramo activo usa la opción
async fn ensure_option_unused(
    uow: &mut dyn UnitOfWork,
    option: &PathwayOption,
    action: &str,
) -> AppResult<()> {
    let legs = uow
        .find_active_legs_by_pathway_option(option.pathway_id, option.id)
        .await?;
    if legs.is_empty() {
        return Ok(());
    }

    let usage = ActiveLegsResponse::new(option.pathway_id, option.id, legs);
    Err(AppError::Conflict(format!(
        "Cannot {} pathway option {}: used by active legs of routes {:?}",
        action, option.id, usage.route_ids
    )))
}

/// Cada caseta debe apuntar a un nodo existente
async fn check_toll_nodes(
    uow: &mut dyn UnitOfWork,
    tolls: &[TollInput],
    errors: &mut FieldErrorCollector,
) -> AppResult<()> {
    for (index, toll) in tolls.iter().enumerate() {
        let field = format!("tolls[{}].nodeId", index);
        if errors.has_error_on(&field) {
            continue;
        }
        if uow.find_node(toll.node_id).await?.is_none() {
            errors.add_missing_reference(field, "Node", toll.node_id);
        }
    }
    Ok(())
}

/// La opción viva con menor id hereda el default
async fn promote_next_default(uow: &mut dyn UnitOfWork, pathway_id: i32) -> AppResult<()> {
    let siblings = uow
        .list_pathway_options(pathway_id, &ListQuery::default())
        .await?;
    let Some(next) = siblings.into_iter().min_by_key(|o| o.id) else {
        return Ok(());
    };

    let mut changes = changes_from(&next);
    changes.is_default = true;
    uow.update_pathway_option(next.id, changes).await?;
    tracing::info!("⭐ Opción {} es ahora la default del pathway {}", next.id, pathway_id);
    Ok(())
}

fn changes_from(option: &PathwayOption) -> PathwayOptionChanges {
    PathwayOptionChanges {
        name: option.name.clone(),
        description: option.description.clone(),
        distance_km: option.distance_km,
        typical_time_min: option.typical_time_min,
        avg_speed_kmh: option.avg_speed_kmh,
        is_default: option.is_default,
        is_pass_through: option.is_pass_through,
        pass_through_time_min: option.pass_through_time_min,
        active: option.active,
    }
}

impl PathwayOptionController {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        pathway_id: i32,
        mut request: CreatePathwayOptionRequest,
    ) -> AppResult<ApiResponse<PathwayOptionResponse>> {
        request.name = request.name.trim().to_string();
        let mut errors = FieldErrorCollector::from_validation(&request);

        let pass_through_time_min =
            match normalize_pass_through(request.is_pass_through, request.pass_through_time_min) {
                Ok(minutes) => minutes,
                Err(error) => {
                    errors.add(error.field, &error.code, error.message, error.value);
                    None
                }
            };

        let mut uow = self.db.begin().await?;
        if uow.find_pathway(pathway_id).await?.is_none() {
            return Err(not_found_error("Pathway", pathway_id));
        }
        check_toll_nodes(uow.as_mut(), &request.tolls, &mut errors).await?;
        errors.into_result()?;

        // La primera opción de un pathway siempre es la default
        let is_first = uow.count_pathway_options(pathway_id).await? == 0;
        let is_default = is_first || request.is_default.unwrap_or(false);
        if is_default {
            uow.clear_default_pathway_options(pathway_id, None).await?;
        }

        let avg_speed_kmh = request
            .avg_speed_kmh
            .unwrap_or_else(|| derive_avg_speed(request.distance_km, request.typical_time_min));

        let option = uow
            .create_pathway_option(NewPathwayOption {
                pathway_id,
                name: request.name,
                description: request.description,
                distance_km: request.distance_km,
                typical_time_min: request.typical_time_min,
                avg_speed_kmh,
                is_default,
                is_pass_through: request.is_pass_through,
                pass_through_time_min,
                active: request.active,
            })
            .await?;
        let tolls = uow
            .replace_tolls(
                option.id,
                request.tolls.into_iter().map(NewToll::from).collect(),
            )
            .await?;
        uow.commit().await?;

        tracing::info!(
            "🧭 Opción {} creada para pathway {} ({} casetas)",
            option.id,
            pathway_id,
            tolls.len()
        );
        Ok(ApiResponse::success_with_message(
            PathwayOptionResponse { option, tolls },
            "Opción creada exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(
        &self,
        pathway_id: i32,
        option_id: i32,
    ) -> AppResult<PathwayOptionResponse> {
        let mut uow = self.db.begin().await?;
        let (_, option) = find_option_in(uow.as_mut(), pathway_id, option_id).await?;
        let tolls = uow.list_tolls(option.id).await?;
        Ok(PathwayOptionResponse { option, tolls })
    }

    pub async fn update(
        &self,
        pathway_id: i32,
        option_id: i32,
        mut request: UpdatePathwayOptionRequest,
    ) -> AppResult<ApiResponse<PathwayOptionResponse>> {
        request.name = request.name.as_deref().map(|n| n.trim().to_string());
        let mut errors = FieldErrorCollector::from_validation(&request);

        let mut uow = self.db.begin().await?;
        let (_, current) = find_option_in(uow.as_mut(), pathway_id, option_id).await?;

        let is_pass_through = request.is_pass_through.unwrap_or(current.is_pass_through);
        let pass_through_time_min = match normalize_pass_through(
            is_pass_through,
            request.pass_through_time_min.or(current.pass_through_time_min),
        ) {
            Ok(minutes) => minutes,
            Err(error) => {
                errors.add(error.field, &error.code, error.message, error.value);
                None
            }
        };
        errors.into_result()?;

        let active = request.active.unwrap_or(current.active);
        if current.active && !active {
            ensure_option_unused(uow.as_mut(), &current, "deactivate").await?;
        }

        let distance_km = request.distance_km.unwrap_or(current.distance_km);
        let typical_time_min = request.typical_time_min.unwrap_or(current.typical_time_min);
        let avg_speed_kmh = match request.avg_speed_kmh {
            Some(speed) => speed,
            None if distance_km != current.distance_km
                || typical_time_min != current.typical_time_min =>
            {
                derive_avg_speed(distance_km, typical_time_min)
            }
            None => current.avg_speed_kmh,
        };

        let is_default = request.is_default.unwrap_or(current.is_default);
        if is_default && !current.is_default {
            uow.clear_default_pathway_options(pathway_id, Some(option_id))
                .await?;
        }

        let changes = PathwayOptionChanges {
            name: request.name.unwrap_or(current.name),
            description: request.description.or(current.description),
            distance_km,
            typical_time_min,
            avg_speed_kmh,
            is_default,
            is_pass_through,
            pass_through_time_min,
            active,
        };
        let option = uow.update_pathway_option(option_id, changes).await?;
        let tolls = uow.list_tolls(option_id).await?;
        uow.commit().await?;

        tracing::info!("✏️ Opción {} actualizada (pathway {})", option_id, pathway_id);
        Ok(ApiResponse::success_with_message(
            PathwayOptionResponse { option, tolls },
            "Opción actualizada exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, pathway_id: i32, option_id: i32) -> AppResult<()> {
        let mut uow = self.db.begin().await?;
        let (pathway, option) = find_option_in(uow.as_mut(), pathway_id, option_id).await?;

        ensure_option_unused(uow.as_mut(), &option, "delete").await?;
        if pathway.active && uow.count_pathway_options(pathway_id).await? <= 1 {
            return Err(AppError::Conflict(format!(
                "Cannot delete the last option of active pathway {}",
                pathway_id
            )));
        }

        uow.soft_delete_pathway_option(option_id).await?;
        if option.is_default {
            promote_next_default(uow.as_mut(), pathway_id).await?;
        }
        uow.commit().await?;

        tracing::info!("🗑️ Opción {} eliminada (pathway {})", option_id, pathway_id);
        Ok(())
    }

    pub async fn list(
        &self,
        pathway_id: i32,
        query: ListQuery<PathwayOptionFilters>,
    ) -> AppResult<Vec<PathwayOption>> {
        let mut uow = self.db.begin().await?;
        if uow.find_pathway(pathway_id).await?.is_none() {
            return Err(not_found_error("Pathway", pathway_id));
        }
        uow.list_pathway_options(pathway_id, &query).await
    }

    /// Marca la opción como default y desmarca a sus hermanas
    pub async fn set_default(
        &self,
        pathway_id: i32,
        option_id: i32,
    ) -> AppResult<ApiResponse<PathwayOption>> {
        let mut uow = self.db.begin().await?;
        let (_, current) = find_option_in(uow.as_mut(), pathway_id, option_id).await?;

        uow.clear_default_pathway_options(pathway_id, Some(option_id))
            .await?;
        let mut changes = changes_from(&current);
        changes.is_default = true;
        let option = uow.update_pathway_option(option_id, changes).await?;
        uow.commit().await?;

        tracing::info!("⭐ Opción {} es ahora la default del pathway {}", option_id, pathway_id);
        Ok(ApiResponse::success_with_message(
            option,
            "Opción marcada como default".to_string(),
        ))
    }

    pub async fn list_tolls(&self, pathway_id: i32, option_id: i32) -> AppResult<Vec<Toll>> {
        let mut uow = self.db.begin().await?;
        let (_, option) = find_option_in(uow.as_mut(), pathway_id, option_id).await?;
        uow.list_tolls(option.id).await
    }

    /// Reemplaza todas las casetas de la opción en una sola transacción
    pub async fn replace_tolls(
        &self,
        pathway_id: i32,
        option_id: i32,
        request: ReplaceTollsRequest,
    ) -> AppResult<ApiResponse<Vec<Toll>>> {
        let mut errors = FieldErrorCollector::from_validation(&request);

        let mut uow = self.db.begin().await?;
        let (_, option) = find_option_in(uow.as_mut(), pathway_id, option_id).await?;
        check_toll_nodes(uow.as_mut(), &request.tolls, &mut errors).await?;
        errors.into_result()?;
        // Los tramos derivados de las rutas dependen de estas casetas
        ensure_option_unused(uow.as_mut(), &option, "change tolls of").await?;

        let tolls = uow
            .replace_tolls(
                option_id,
                request.tolls.into_iter().map(NewToll::from).collect(),
            )
            .await?;
        uow.commit().await?;

        tracing::info!("🚧 {} casetas guardadas para la opción {}", tolls.len(), option_id);
        Ok(ApiResponse::success_with_message(
            tolls,
            "Casetas actualizadas exitosamente".to_string(),
        ))
    }

    pub async fn active_legs(
        &self,
        pathway_id: i32,
        option_id: i32,
    ) -> AppResult<ActiveLegsResponse> {
        let mut uow = self.db.begin().await?;
        find_option_in(uow.as_mut(), pathway_id, option_id).await?;
        let legs = uow
            .find_active_legs_by_pathway_option(pathway_id, option_id)
            .await?;
        Ok(ActiveLegsResponse::new(pathway_id, option_id, legs))
    }
}
