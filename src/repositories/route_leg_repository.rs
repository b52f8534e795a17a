use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use crate::database::memory::{unique_violation, MemoryUnitOfWork};
use crate::database::postgres::PgUnitOfWork;
use crate::models::route::{NewRouteLeg, RouteLeg};
use crate::utils::errors::{map_unique_violation, AppResult};

const POSITION_CONSTRAINT: &str = "route_legs_route_position_active_key";

#[async_trait]
pub trait RouteLegRepository: Send {
    /// Inserta el lote completo o nada.
    ///
    /// No valida posiciones: el índice único `(route_id, position)` es el
    /// único respaldo y una posición repetida hace fallar todo el lote.
    async fn create_legs(&mut self, legs: Vec<NewRouteLeg>) -> AppResult<Vec<RouteLeg>>;

    /// Borrado físico de todos los tramos de la ruta; la ruta no se toca
    async fn delete_legs_by_route_id(&mut self, route_id: i32) -> AppResult<u64>;

    /// Tramos no borrados de la ruta, por posición
    async fn find_legs_by_route_id(&mut self, route_id: i32) -> AppResult<Vec<RouteLeg>>;

    /// Tramos activos y no borrados que usan el par pathway + opción
    async fn find_active_legs_by_pathway_option(
        &mut self,
        pathway_id: i32,
        pathway_option_id: i32,
    ) -> AppResult<Vec<RouteLeg>>;

    async fn find_active_legs_by_pathway(&mut self, pathway_id: i32) -> AppResult<Vec<RouteLeg>>;

    async fn soft_delete_legs_by_route_id(&mut self, route_id: i32) -> AppResult<u64>;
}

#[async_trait]
impl RouteLegRepository for PgUnitOfWork {
    async fn create_legs(&mut self, legs: Vec<NewRouteLeg>) -> AppResult<Vec<RouteLeg>> {
        if legs.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO route_legs (route_id, position, origin_node_id, destination_node_id, \
             pathway_id, pathway_option_id, is_derived, active) ",
        );
        qb.push_values(legs, |mut row, leg| {
            let is_derived = leg.is_derived();
            let active = leg.is_active();
            row.push_bind(leg.route_id)
                .push_bind(leg.position)
                .push_bind(leg.origin_node_id)
                .push_bind(leg.destination_node_id)
                .push_bind(leg.pathway_id)
                .push_bind(leg.pathway_option_id)
                .push_bind(is_derived)
                .push_bind(active);
        });
        qb.push(" RETURNING *");

        let mut created = qb
            .build_query_as::<RouteLeg>()
            .fetch_all(self.conn())
            .await
            .map_err(|e| map_unique_violation(e, "RouteLeg"))?;
        created.sort_by_key(|leg| (leg.route_id, leg.position));
        Ok(created)
    }

    async fn delete_legs_by_route_id(&mut self, route_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM route_legs WHERE route_id = $1")
            .bind(route_id)
            .execute(self.conn())
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_legs_by_route_id(&mut self, route_id: i32) -> AppResult<Vec<RouteLeg>> {
        let legs = sqlx::query_as::<_, RouteLeg>(
            r#"
            SELECT * FROM route_legs
            WHERE route_id = $1 AND deleted_at IS NULL
            ORDER BY position ASC
            "#,
        )
        .bind(route_id)
        .fetch_all(self.conn())
        .await?;
        Ok(legs)
    }

    async fn find_active_legs_by_pathway_option(
        &mut self,
        pathway_id: i32,
        pathway_option_id: i32,
    ) -> AppResult<Vec<RouteLeg>> {
        let legs = sqlx::query_as::<_, RouteLeg>(
            r#"
            SELECT * FROM route_legs
            WHERE pathway_id = $1 AND pathway_option_id = $2
              AND active AND deleted_at IS NULL
            ORDER BY route_id ASC, position ASC
            "#,
        )
        .bind(pathway_id)
        .bind(pathway_option_id)
        .fetch_all(self.conn())
        .await?;
        Ok(legs)
    }

    async fn find_active_legs_by_pathway(&mut self, pathway_id: i32) -> AppResult<Vec<RouteLeg>> {
        let legs = sqlx::query_as::<_, RouteLeg>(
            r#"
            SELECT * FROM route_legs
            WHERE pathway_id = $1 AND active AND deleted_at IS NULL
            ORDER BY route_id ASC, position ASC
            "#,
        )
        .bind(pathway_id)
        .fetch_all(self.conn())
        .await?;
        Ok(legs)
    }

    async fn soft_delete_legs_by_route_id(&mut self, route_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE route_legs
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE route_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(route_id)
        .execute(self.conn())
        .await?;
        Ok(result.rows_affected())
    }
}

impl MemoryUnitOfWork {
    fn active_legs_where(&self, predicate: impl Fn(&RouteLeg) -> bool) -> Vec<RouteLeg> {
        let mut legs: Vec<RouteLeg> = self
            .tables
            .route_legs
            .values()
            .filter(|leg| leg.active && leg.deleted_at.is_none() && predicate(leg))
            .cloned()
            .collect();
        legs.sort_by_key(|leg| (leg.route_id, leg.position));
        legs
    }
}

#[async_trait]
impl RouteLegRepository for MemoryUnitOfWork {
    async fn create_legs(&mut self, legs: Vec<NewRouteLeg>) -> AppResult<Vec<RouteLeg>> {
        let mut taken: HashSet<(i32, i32)> = self
            .tables
            .route_legs
            .values()
            .filter(|leg| leg.deleted_at.is_none())
            .map(|leg| (leg.route_id, leg.position))
            .collect();
        for leg in &legs {
            if !taken.insert((leg.route_id, leg.position)) {
                return Err(unique_violation("RouteLeg", POSITION_CONSTRAINT));
            }
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(legs.len());
        for leg in legs {
            let row = RouteLeg {
                id: self.tables.next_id("route_legs"),
                position: leg.position,
                route_id: leg.route_id,
                origin_node_id: leg.origin_node_id,
                destination_node_id: leg.destination_node_id,
                pathway_id: leg.pathway_id,
                pathway_option_id: leg.pathway_option_id,
                is_derived: leg.is_derived(),
                active: leg.is_active(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            self.tables.route_legs.insert(row.id, row.clone());
            created.push(row);
        }
        created.sort_by_key(|leg| (leg.route_id, leg.position));
        Ok(created)
    }

    async fn delete_legs_by_route_id(&mut self, route_id: i32) -> AppResult<u64> {
        let before = self.tables.route_legs.len();
        self.tables
            .route_legs
            .retain(|_, leg| leg.route_id != route_id);
        Ok((before - self.tables.route_legs.len()) as u64)
    }

    async fn find_legs_by_route_id(&mut self, route_id: i32) -> AppResult<Vec<RouteLeg>> {
        let mut legs: Vec<RouteLeg> = self
            .tables
            .route_legs
            .values()
            .filter(|leg| leg.route_id == route_id && leg.deleted_at.is_none())
            .cloned()
            .collect();
        legs.sort_by_key(|leg| leg.position);
        Ok(legs)
    }

    async fn find_active_legs_by_pathway_option(
        &mut self,
        pathway_id: i32,
        pathway_option_id: i32,
    ) -> AppResult<Vec<RouteLeg>> {
        Ok(self.active_legs_where(|leg| {
            leg.pathway_id == pathway_id && leg.pathway_option_id == pathway_option_id
        }))
    }

    async fn find_active_legs_by_pathway(&mut self, pathway_id: i32) -> AppResult<Vec<RouteLeg>> {
        Ok(self.active_legs_where(|leg| leg.pathway_id == pathway_id))
    }

    async fn soft_delete_legs_by_route_id(&mut self, route_id: i32) -> AppResult<u64> {
        let now = Utc::now();
        let mut affected = 0;
        for leg in self.tables.route_legs.values_mut() {
            if leg.route_id == route_id && leg.deleted_at.is_none() {
                leg.deleted_at = Some(now);
                leg.updated_at = now;
                affected += 1;
            }
        }
        Ok(affected)
    }
}
