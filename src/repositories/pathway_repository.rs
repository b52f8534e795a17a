use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use crate::database::memory::{
    find_live, list_records, soft_delete_in, unique_violation, values_in_use, MemoryUnitOfWork,
};
use crate::database::postgres::{push_eq, PgFilter, PgUnitOfWork, TableDescriptor};
use crate::models::listing::{ListQuery, PageRequest};
use crate::models::pathway::{NewPathway, Pathway, PathwayChanges, PathwayFilters};
use crate::utils::errors::{map_unique_violation, not_found_error, AppResult};

pub const PATHWAYS: TableDescriptor = TableDescriptor {
    table: "pathways",
    entity: "Pathway",
    search_columns: &["name", "code"],
    sort_columns: &["id", "name", "code", "created_at", "updated_at"],
};

const CODE_CONSTRAINT: &str = "pathways_code_active_key";

#[async_trait]
pub trait PathwayRepository: Send {
    async fn create_pathway(&mut self, pathway: NewPathway) -> AppResult<Pathway>;

    async fn find_pathway(&mut self, id: i32) -> AppResult<Option<Pathway>>;

    async fn update_pathway(&mut self, id: i32, changes: PathwayChanges) -> AppResult<Pathway>;

    async fn soft_delete_pathway(&mut self, id: i32) -> AppResult<()>;

    async fn list_pathways(
        &mut self,
        query: &ListQuery<PathwayFilters>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<Pathway>, i64)>;

    async fn find_pathway_codes_in_use(
        &mut self,
        codes: &[String],
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<String>>;

    /// Pathways no borrados que salen o llegan a `node_id`
    async fn count_pathways_using_node(&mut self, node_id: i32) -> AppResult<i64>;
}

impl PgFilter for PathwayFilters {
    fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        push_eq(qb, "active", self.active);
        push_eq(qb, "origin_node_id", self.origin_node_id);
        push_eq(qb, "destination_node_id", self.destination_node_id);
        push_eq(qb, "is_empty_trip", self.is_empty_trip);
        push_eq(qb, "is_sellable", self.is_sellable);
    }
}

#[async_trait]
impl PathwayRepository for PgUnitOfWork {
    async fn create_pathway(&mut self, pathway: NewPathway) -> AppResult<Pathway> {
        sqlx::query_as::<_, Pathway>(
            r#"
            INSERT INTO pathways (origin_node_id, destination_node_id, name, code, description,
                                  is_empty_trip, is_sellable, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(pathway.origin_node_id)
        .bind(pathway.destination_node_id)
        .bind(pathway.name)
        .bind(pathway.code)
        .bind(pathway.description)
        .bind(pathway.is_empty_trip)
        .bind(pathway.is_sellable)
        .bind(pathway.active)
        .fetch_one(self.conn())
        .await
        .map_err(|e| map_unique_violation(e, "Pathway"))
    }

    async fn find_pathway(&mut self, id: i32) -> AppResult<Option<Pathway>> {
        PATHWAYS.find_active(self.conn(), id).await
    }

    async fn update_pathway(&mut self, id: i32, changes: PathwayChanges) -> AppResult<Pathway> {
        sqlx::query_as::<_, Pathway>(
            r#"
            UPDATE pathways
            SET name = COALESCE($2, name),
                code = COALESCE($3, code),
                description = COALESCE($4, description),
                is_empty_trip = COALESCE($5, is_empty_trip),
                is_sellable = COALESCE($6, is_sellable),
                active = COALESCE($7, active),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.code)
        .bind(changes.description)
        .bind(changes.is_empty_trip)
        .bind(changes.is_sellable)
        .bind(changes.active)
        .fetch_optional(self.conn())
        .await
        .map_err(|e| map_unique_violation(e, "Pathway"))?
        .ok_or_else(|| not_found_error("Pathway", id))
    }

    async fn soft_delete_pathway(&mut self, id: i32) -> AppResult<()> {
        PATHWAYS.soft_delete(self.conn(), id).await
    }

    async fn list_pathways(
        &mut self,
        query: &ListQuery<PathwayFilters>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<Pathway>, i64)> {
        PATHWAYS.list(self.conn(), &query.filters, query, page).await
    }

    async fn find_pathway_codes_in_use(
        &mut self,
        codes: &[String],
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<String>> {
        PATHWAYS
            .values_in_use(self.conn(), "code", codes, exclude_id)
            .await
    }

    async fn count_pathways_using_node(&mut self, node_id: i32) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM pathways
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
impl PathwayRepository for MemoryUnitOfWork {
    async fn create_pathway(&mut self, pathway: NewPathway) -> AppResult<Pathway> {
        let tables = &mut self.tables;
        if tables
            .pathways
            .values()
            .any(|p| p.deleted_at.is_none() && p.code == pathway.code)
        {
            return Err(unique_violation("Pathway", CODE_CONSTRAINT));
        }

        let now = Utc::now();
        let row = Pathway {
            id: tables.next_id("pathways"),
            origin_node_id: pathway.origin_node_id,
            destination_node_id: pathway.destination_node_id,
            name: pathway.name,
            code: pathway.code,
            description: pathway.description,
            is_empty_trip: pathway.is_empty_trip,
            is_sellable: pathway.is_sellable,
            active: pathway.active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.pathways.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_pathway(&mut self, id: i32) -> AppResult<Option<Pathway>> {
        Ok(find_live(&self.tables.pathways, id))
    }

    async fn update_pathway(&mut self, id: i32, changes: PathwayChanges) -> AppResult<Pathway> {
        let pathways = &mut self.tables.pathways;
        if let Some(code) = &changes.code {
            if pathways
                .values()
                .any(|p| p.deleted_at.is_none() && p.id != id && &p.code == code)
            {
                return Err(unique_violation("Pathway", CODE_CONSTRAINT));
            }
        }

        let pathway = pathways
            .get_mut(&id)
            .filter(|p| p.deleted_at.is_none())
            .ok_or_else(|| not_found_error("Pathway", id))?;
        changes.apply_to(pathway);
        pathway.updated_at = Utc::now();
        Ok(pathway.clone())
    }

    async fn soft_delete_pathway(&mut self, id: i32) -> AppResult<()> {
        soft_delete_in(&mut self.tables.pathways, "Pathway", id)
    }

    async fn list_pathways(
        &mut self,
        query: &ListQuery<PathwayFilters>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<Pathway>, i64)> {
        Ok(list_records(
            self.tables.pathways.values(),
            |p| query.filters.matches(p),
            query,
            page,
        ))
    }

    async fn find_pathway_codes_in_use(
        &mut self,
        codes: &[String],
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<String>> {
        Ok(values_in_use(
            self.tables.pathways.values(),
            |p| p.code.as_str(),
            codes,
            exclude_id,
        ))
    }

    async fn count_pathways_using_node(&mut self, node_id: i32) -> AppResult<i64> {
        let count = self
            .tables
            .pathways
            .values()
            .filter(|p| {
                p.deleted_at.is_none()
                    && (p.origin_node_id == node_id || p.destination_node_id == node_id)
            })
            .count();
        Ok(count as i64)
    }
}
