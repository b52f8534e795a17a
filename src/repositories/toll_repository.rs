use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use crate::database::memory::MemoryUnitOfWork;
use crate::database::postgres::PgUnitOfWork;
use crate::models::pathway_option::{NewToll, Toll};
use crate::utils::errors::AppResult;

/// Las casetas no tienen borrado lógico: se reemplazan completas con su opción
#[async_trait]
pub trait TollRepository: Send {
    /// Casetas de la opción en orden de inserción
    async fn list_tolls(&mut self, pathway_option_id: i32) -> AppResult<Vec<Toll>>;

    async fn replace_tolls(
        &mut self,
        pathway_option_id: i32,
        tolls: Vec<NewToll>,
    ) -> AppResult<Vec<Toll>>;

    /// Casetas de opciones no borradas que pasan por el nodo
    async fn count_tolls_using_node(&mut self, node_id: i32) -> AppResult<i64>;
}

#[async_trait]
impl TollRepository for PgUnitOfWork {
    async fn list_tolls(&mut self, pathway_option_id: i32) -> AppResult<Vec<Toll>> {
        let tolls = sqlx::query_as::<_, Toll>(
            "SELECT * FROM pathway_option_tolls WHERE pathway_option_id = $1 ORDER BY id ASC",
        )
        .bind(pathway_option_id)
        .fetch_all(self.conn())
        .await?;
        Ok(tolls)
    }

    async fn replace_tolls(
        &mut self,
        pathway_option_id: i32,
        tolls: Vec<NewToll>,
    ) -> AppResult<Vec<Toll>> {
        sqlx::query("DELETE FROM pathway_option_tolls WHERE pathway_option_id = $1")
            .bind(pathway_option_id)
            .execute(self.conn())
            .await?;

        if tolls.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO pathway_option_tolls (pathway_option_id, node_id, pass_time_min, distance) ",
        );
        qb.push_values(tolls, |mut row, toll| {
            row.push_bind(pathway_option_id)
                .push_bind(toll.node_id)
                .push_bind(toll.pass_time_min)
                .push_bind(toll.distance);
        });
        qb.push(" RETURNING *");

        let mut inserted = qb.build_query_as::<Toll>().fetch_all(self.conn()).await?;
        inserted.sort_by_key(|t| t.id);
        Ok(inserted)
    }

    async fn count_tolls_using_node(&mut self, node_id: i32) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM pathway_option_tolls t
            JOIN pathway_options o ON o.id = t.pathway_option_id
            WHERE t.node_id = $1 AND o.deleted_at IS NULL
            "#,
        )
        .bind(node_id)
        .fetch_one(self.conn())
        .await?;
        Ok(count)
    }
}

#[async_trait]
impl TollRepository for MemoryUnitOfWork {
    async fn list_tolls(&mut self, pathway_option_id: i32) -> AppResult<Vec<Toll>> {
        Ok(self
            .tables
            .tolls
            .values()
            .filter(|t| t.pathway_option_id == pathway_option_id)
            .cloned()
            .collect())
    }

    async fn replace_tolls(
        &mut self,
        pathway_option_id: i32,
        tolls: Vec<NewToll>,
    ) -> AppResult<Vec<Toll>> {
        self.tables
            .tolls
            .retain(|_, t| t.pathway_option_id != pathway_option_id);

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(tolls.len());
        for toll in tolls {
            let row = Toll {
                id: self.tables.next_id("pathway_option_tolls"),
                pathway_option_id,
                node_id: toll.node_id,
                pass_time_min: toll.pass_time_min,
                distance: toll.distance,
                created_at: now,
            };
            self.tables.tolls.insert(row.id, row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn count_tolls_using_node(&mut self, node_id: i32) -> AppResult<i64> {
        let options = &self.tables.pathway_options;
        let count = self
            .tables
            .tolls
            .values()
            .filter(|t| t.node_id == node_id)
            .filter(|t| {
                options
                    .get(&t.pathway_option_id)
                    .is_some_and(|o| o.deleted_at.is_none())
            })
            .count();
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Database, MemoryDatabase};
    use crate::models::pathway_option::NewPathwayOption;
    use crate::repositories::PathwayOptionRepository;
    use rust_decimal::Decimal;

    fn option(pathway_id: i32) -> NewPathwayOption {
        NewPathwayOption {
            pathway_id,
            name: "Autopista".to_string(),
            description: None,
            distance_km: Decimal::from(100),
            typical_time_min: 60,
            avg_speed_kmh: Decimal::from(100),
            is_default: false,
            is_pass_through: false,
            pass_through_time_min: None,
            active: true,
        }
    }

    fn toll(node_id: i32) -> NewToll {
        NewToll {
            node_id,
            pass_time_min: 2,
            distance: Decimal::from(40),
        }
    }

    #[tokio::test]
    async fn test_count_tolls_using_node_ignores_deleted_options() {
        let db = MemoryDatabase::new();
        let mut uow = db.begin().await.unwrap();
        let live = uow.create_pathway_option(option(1)).await.unwrap();
        let gone = uow.create_pathway_option(option(2)).await.unwrap();
        uow.replace_tolls(live.id, vec![toll(7), toll(8)]).await.unwrap();
        uow.replace_tolls(gone.id, vec![toll(7)]).await.unwrap();
        uow.soft_delete_pathway_option(gone.id).await.unwrap();

        assert_eq!(uow.count_tolls_using_node(7).await.unwrap(), 1);
        assert_eq!(uow.count_tolls_using_node(9).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replace_tolls_keeps_insertion_order() {
        let db = MemoryDatabase::new();
        let mut uow = db.begin().await.unwrap();
        let created = uow.create_pathway_option(option(1)).await.unwrap();
        uow.replace_tolls(created.id, vec![toll(3)]).await.unwrap();

        let replaced = uow
            .replace_tolls(created.id, vec![toll(5), toll(4)])
            .await
            .unwrap();
        let listed = uow.list_tolls(created.id).await.unwrap();

        assert_eq!(listed, replaced);
        let nodes: Vec<i32> = listed.iter().map(|t| t.node_id).collect();
        assert_eq!(nodes, vec![5, 4]);
    }
}
