use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use crate::database::memory::{
    find_live, list_records, soft_delete_in, unique_violation, values_in_use, MemoryUnitOfWork,
};
use crate::database::postgres::{push_eq, PgFilter, PgUnitOfWork, TableDescriptor};
use crate::models::listing::{ListQuery, PageRequest};
use crate::models::route::{NewRoute, Route, RouteChanges, RouteFilters};
use crate::utils::errors::{map_unique_violation, not_found_error, AppResult};

pub const ROUTES: TableDescriptor = TableDescriptor {
    table: "routes",
    entity: "Route",
    search_columns: &["name", "code"],
    sort_columns: &["id", "name", "code", "created_at", "updated_at"],
};

const CODE_CONSTRAINT: &str = "routes_code_active_key";

#[async_trait]
pub trait RouteRepository: Send {
    async fn create_route(&mut self, route: NewRoute) -> AppResult<Route>;

    async fn find_route(&mut self, id: i32) -> AppResult<Option<Route>>;

    async fn update_route(&mut self, id: i32, changes: RouteChanges) -> AppResult<Route>;

    async fn soft_delete_route(&mut self, id: i32) -> AppResult<()>;

    async fn list_routes(
        &mut self,
        query: &ListQuery<RouteFilters>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<Route>, i64)>;

    async fn find_route_codes_in_use(
        &mut self,
        codes: &[String],
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<String>>;

    async fn count_routes_using_node(&mut self, node_id: i32) -> AppResult<i64>;
}

impl PgFilter for RouteFilters {
    fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        push_eq(qb, "active", self.active);
        push_eq(qb, "busline_id", self.busline_id);
        push_eq(qb, "service_type_id", self.service_type_id);
        push_eq(qb, "origin_node_id", self.origin_node_id);
        push_eq(qb, "destination_node_id", self.destination_node_id);
    }
}

#[async_trait]
impl RouteRepository for PgUnitOfWork {
    async fn create_route(&mut self, route: NewRoute) -> AppResult<Route> {
        sqlx::query_as::<_, Route>(
            r#"
            INSERT INTO routes (name, code, busline_id, service_type_id, origin_node_id,
                                destination_node_id, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(route.name)
        .bind(route.code)
        .bind(route.busline_id)
        .bind(route.service_type_id)
        .bind(route.origin_node_id)
        .bind(route.destination_node_id)
        .bind(route.active)
        .fetch_one(self.conn())
        .await
        .map_err(|e| map_unique_violation(e, "Route"))
    }

    async fn find_route(&mut self, id: i32) -> AppResult<Option<Route>> {
        ROUTES.find_active(self.conn(), id).await
    }

    async fn update_route(&mut self, id: i32, changes: RouteChanges) -> AppResult<Route> {
        sqlx::query_as::<_, Route>(
            r#"
            UPDATE routes
            SET name = COALESCE($2, name),
                code = COALESCE($3, code),
                busline_id = COALESCE($4, busline_id),
                service_type_id = COALESCE($5, service_type_id),
                origin_node_id = COALESCE($6, origin_node_id),
                destination_node_id = COALESCE($7, destination_node_id),
                active = COALESCE($8, active),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.code)
        .bind(changes.busline_id)
        .bind(changes.service_type_id)
        .bind(changes.origin_node_id)
        .bind(changes.destination_node_id)
        .bind(changes.active)
        .fetch_optional(self.conn())
        .await
        .map_err(|e| map_unique_violation(e, "Route"))?
        .ok_or_else(|| not_found_error("Route", id))
    }

    async fn soft_delete_route(&mut self, id: i32) -> AppResult<()> {
        ROUTES.soft_delete(self.conn(), id).await
    }

    async fn list_routes(
        &mut self,
        query: &ListQuery<RouteFilters>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<Route>, i64)> {
        ROUTES.list(self.conn(), &query.filters, query, page).await
    }

    async fn find_route_codes_in_use(
        &mut self,
        codes: &[String],
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<String>> {
        ROUTES
            .values_in_use(self.conn(), "code", codes, exclude_id)
            .await
    }

    async fn count_routes_using_node(&mut self, node_id: i32) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM routes
            WHERE deleted_at IS NULL AND (origin_node_id = $1 OR destination_node_id = $1)
            "#,
        )
        .bind(node_id)
        .fetch_one(self.conn())
        .await?;
        Ok(count)
    }
}

#[async_trait]
impl RouteRepository for MemoryUnitOfWork {
    async fn create_route(&mut self, route: NewRoute) -> AppResult<Route> {
        let tables = &mut self.tables;
        if tables
            .routes
            .values()
            .any(|r| r.deleted_at.is_none() && r.code == route.code)
        {
            return Err(unique_violation("Route", CODE_CONSTRAINT));
        }

        let now = Utc::now();
        let row = Route {
            id: tables.next_id("routes"),
            name: route.name,
            code: route.code,
            busline_id: route.busline_id,
            service_type_id: route.service_type_id,
            origin_node_id: route.origin_node_id,
            destination_node_id: route.destination_node_id,
            active: route.active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.routes.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_route(&mut self, id: i32) -> AppResult<Option<Route>> {
        Ok(find_live(&self.tables.routes, id))
    }

    async fn update_route(&mut self, id: i32, changes: RouteChanges) -> AppResult<Route> {
        let routes = &mut self.tables.routes;
        if let Some(code) = &changes.code {
            if routes
                .values()
                .any(|r| r.deleted_at.is_none() && r.id != id && &r.code == code)
            {
                return Err(unique_violation("Route", CODE_CONSTRAINT));
            }
        }

        let route = routes
            .get_mut(&id)
            .filter(|r| r.deleted_at.is_none())
            .ok_or_else(|| not_found_error("Route", id))?;
        changes.apply_to(route);
        route.updated_at = Utc::now();
        Ok(route.clone())
    }

    async fn soft_delete_route(&mut self, id: i32) -> AppResult<()> {
        soft_delete_in(&mut self.tables.routes, "Route", id)
    }

    async fn list_routes(
        &mut self,
        query: &ListQuery<RouteFilters>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<Route>, i64)> {
        Ok(list_records(
            self.tables.routes.values(),
            |r| query.filters.matches(r),
            query,
            page,
        ))
    }

    async fn find_route_codes_in_use(
        &mut self,
        codes: &[String],
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<String>> {
        Ok(values_in_use(
            self.tables.routes.values(),
            |r| r.code.as_str(),
            codes,
            exclude_id,
        ))
    }

    async fn count_routes_using_node(&mut self, node_id: i32) -> AppResult<i64> {
        let count = self
            .tables
            .routes
            .values()
            .filter(|r| {
                r.deleted_at.is_none()
                    && (r.origin_node_id == node_id || r.destination_node_id == node_id)
            })
            .count();
        Ok(count as i64)
    }
}
