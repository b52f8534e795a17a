use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use crate::database::memory::{
    find_live, list_records, soft_delete_in, unique_violation, MemoryUnitOfWork,
};
use crate::database::postgres::{push_eq, PgFilter, PgUnitOfWork, TableDescriptor};
use crate::models::listing::ListQuery;
use crate::models::pathway_option::{
    NewPathwayOption, PathwayOption, PathwayOptionChanges, PathwayOptionFilters,
};
use crate::utils::errors::{map_unique_violation, not_found_error, AppResult};

pub const PATHWAY_OPTIONS: TableDescriptor = TableDescriptor {
    table: "pathway_options",
    entity: "PathwayOption",
    search_columns: &["name"],
    sort_columns: &["id", "name", "created_at", "updated_at"],
};

const DEFAULT_CONSTRAINT: &str = "pathway_options_single_default_key";

#[async_trait]
pub trait PathwayOptionRepository: Send {
    async fn create_pathway_option(&mut self, option: NewPathwayOption)
        -> AppResult<PathwayOption>;

    async fn find_pathway_option(&mut self, id: i32) -> AppResult<Option<PathwayOption>>;

    async fn update_pathway_option(
        &mut self,
        id: i32,
        changes: PathwayOptionChanges,
    ) -> AppResult<PathwayOption>;

    async fn soft_delete_pathway_option(&mut self, id: i32) -> AppResult<()>;

    async fn list_pathway_options(
        &mut self,
        pathway_id: i32,
        query: &ListQuery<PathwayOptionFilters>,
    ) -> AppResult<Vec<PathwayOption>>;

    /// Opciones no borradas del pathway
    async fn count_pathway_options(&mut self, pathway_id: i32) -> AppResult<i64>;

    /// Quita `is_default` a todas las opciones del pathway salvo `keep_id`
    async fn clear_default_pathway_options(
        &mut self,
        pathway_id: i32,
        keep_id: Option<i32>,
    ) -> AppResult<()>;

    async fn soft_delete_pathway_options_by_pathway(&mut self, pathway_id: i32) -> AppResult<u64>;
}

/// Restringe el listado a las opciones de un pathway
struct OptionScope<'a> {
    pathway_id: i32,
    filters: &'a PathwayOptionFilters,
}

impl PgFilter for OptionScope<'_> {
    fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        push_eq(qb, "pathway_id", Some(self.pathway_id));
        push_eq(qb, "active", self.filters.active);
        push_eq(qb, "is_default", self.filters.is_default);
    }
}

#[async_trait]
impl PathwayOptionRepository for PgUnitOfWork {
    async fn create_pathway_option(
        &mut self,
        option: NewPathwayOption,
    ) -> AppResult<PathwayOption> {
        sqlx::query_as::<_, PathwayOption>(
            r#"
            INSERT INTO pathway_options (pathway_id, name, description, distance_km, typical_time_min,
                                         avg_speed_kmh, is_default, is_pass_through,
                                         pass_through_time_min, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(option.pathway_id)
        .bind(option.name)
        .bind(option.description)
        .bind(option.distance_km)
        .bind(option.typical_time_min)
        .bind(option.avg_speed_kmh)
        .bind(option.is_default)
        .bind(option.is_pass_through)
        .bind(option.pass_through_time_min)
        .bind(option.active)
        .fetch_one(self.conn())
        .await
        .map_err(|e| map_unique_violation(e, "PathwayOption"))
    }

    async fn find_pathway_option(&mut self, id: i32) -> AppResult<Option<PathwayOption>> {
        PATHWAY_OPTIONS.find_active(self.conn(), id).await
    }

    async fn update_pathway_option(
        &mut self,
        id: i32,
        changes: PathwayOptionChanges,
    ) -> AppResult<PathwayOption> {
        sqlx::query_as::<_, PathwayOption>(
            r#"
            UPDATE pathway_options
            SET name = $2,
                description = $3,
                distance_km = $4,
                typical_time_min = $5,
                avg_speed_kmh = $6,
                is_default = $7,
                is_pass_through = $8,
                pass_through_time_min = $9,
                active = $10,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.distance_km)
        .bind(changes.typical_time_min)
        .bind(changes.avg_speed_kmh)
        .bind(changes.is_default)
        .bind(changes.is_pass_through)
        .bind(changes.pass_through_time_min)
        .bind(changes.active)
        .fetch_optional(self.conn())
        .await
        .map_err(|e| map_unique_violation(e, "PathwayOption"))?
        .ok_or_else(|| not_found_error("PathwayOption", id))
    }

    async fn soft_delete_pathway_option(&mut self, id: i32) -> AppResult<()> {
        PATHWAY_OPTIONS.soft_delete(self.conn(), id).await
    }

    async fn list_pathway_options(
        &mut self,
        pathway_id: i32,
        query: &ListQuery<PathwayOptionFilters>,
    ) -> AppResult<Vec<PathwayOption>> {
        let scope = OptionScope {
            pathway_id,
            filters: &query.filters,
        };
        let (options, _) = PATHWAY_OPTIONS.list(self.conn(), &scope, query, None).await?;
        Ok(options)
    }

    async fn count_pathway_options(&mut self, pathway_id: i32) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM pathway_options WHERE pathway_id = $1 AND deleted_at IS NULL",
        )
        .bind(pathway_id)
        .fetch_one(self.conn())
        .await?;
        Ok(count)
    }

    async fn clear_default_pathway_options(
        &mut self,
        pathway_id: i32,
        keep_id: Option<i32>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE pathway_options
            SET is_default = FALSE, updated_at = NOW()
            WHERE pathway_id = $1 AND is_default AND deleted_at IS NULL
              AND ($2::int IS NULL OR id <> $2)
            "#,
        )
        .bind(pathway_id)
        .bind(keep_id)
        .execute(self.conn())
        .await?;
        Ok(())
    }

    async fn soft_delete_pathway_options_by_pathway(&mut self, pathway_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE pathway_options
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE pathway_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(pathway_id)
        .execute(self.conn())
        .await?;
        Ok(result.rows_affected())
    }
}

impl MemoryUnitOfWork {
    fn check_single_default(
        &self,
        pathway_id: i32,
        is_default: bool,
        exclude_id: Option<i32>,
    ) -> AppResult<()> {
        let taken = is_default
            && self.tables.pathway_options.values().any(|o| {
                o.deleted_at.is_none()
                    && o.pathway_id == pathway_id
                    && o.is_default
                    && Some(o.id) != exclude_id
            });
        if taken {
            return Err(unique_violation("PathwayOption", DEFAULT_CONSTRAINT));
        }
        Ok(())
    }
}

#[async_trait]
impl PathwayOptionRepository for MemoryUnitOfWork {
    async fn create_pathway_option(
        &mut self,
        option: NewPathwayOption,
    ) -> AppResult<PathwayOption> {
        self.check_single_default(option.pathway_id, option.is_default, None)?;

        let now = Utc::now();
        let row = PathwayOption {
            id: self.tables.next_id("pathway_options"),
            pathway_id: option.pathway_id,
            name: option.name,
            description: option.description,
            distance_km: option.distance_km,
            typical_time_min: option.typical_time_min,
            avg_speed_kmh: option.avg_speed_kmh,
            is_default: option.is_default,
            is_pass_through: option.is_pass_through,
            pass_through_time_min: option.pass_through_time_min,
            active: option.active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.tables.pathway_options.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_pathway_option(&mut self, id: i32) -> AppResult<Option<PathwayOption>> {
        Ok(find_live(&self.tables.pathway_options, id))
    }

    async fn update_pathway_option(
        &mut self,
        id: i32,
        changes: PathwayOptionChanges,
    ) -> AppResult<PathwayOption> {
        let pathway_id = find_live(&self.tables.pathway_options, id)
            .map(|o| o.pathway_id)
            .ok_or_else(|| not_found_error("PathwayOption", id))?;
        self.check_single_default(pathway_id, changes.is_default, Some(id))?;

        let option = self
            .tables
            .pathway_options
            .get_mut(&id)
            .ok_or_else(|| not_found_error("PathwayOption", id))?;
        changes.apply_to(option);
        option.updated_at = Utc::now();
        Ok(option.clone())
    }

    async fn soft_delete_pathway_option(&mut self, id: i32) -> AppResult<()> {
        soft_delete_in(&mut self.tables.pathway_options, "PathwayOption", id)
    }

    async fn list_pathway_options(
        &mut self,
        pathway_id: i32,
        query: &ListQuery<PathwayOptionFilters>,
    ) -> AppResult<Vec<PathwayOption>> {
        let (options, _) = list_records(
            self.tables.pathway_options.values(),
            |o| o.pathway_id == pathway_id && query.filters.matches(o),
            query,
            None,
        );
        Ok(options)
    }

    async fn count_pathway_options(&mut self, pathway_id: i32) -> AppResult<i64> {
        let count = self
            .tables
            .pathway_options
            .values()
            .filter(|o| o.deleted_at.is_none() && o.pathway_id == pathway_id)
            .count();
        Ok(count as i64)
    }

    async fn clear_default_pathway_options(
        &mut self,
        pathway_id: i32,
        keep_id: Option<i32>,
    ) -> AppResult<()> {
        let now = Utc::now();
        for option in self.tables.pathway_options.values_mut() {
            if option.deleted_at.is_none()
                && option.pathway_id == pathway_id
                && option.is_default
                && Some(option.id) != keep_id
            {
                option.is_default = false;
                option.updated_at = now;
            }
        }
        Ok(())
    }

    async fn soft_delete_pathway_options_by_pathway(&mut self, pathway_id: i32) -> AppResult<u64> {
        let now = Utc::now();
        let mut affected = 0;
        for option in self.tables.pathway_options.values_mut() {
            if option.deleted_at.is_none() && option.pathway_id == pathway_id {
                option.deleted_at = Some(now);
                option.updated_at = now;
                affected += 1;
            }
        }
        Ok(affected)
    }
}
