//! Backend PostgreSQL
//!
//! `PgUnitOfWork` envuelve una `sqlx::Transaction`; los repositorios la usan
//! a través de `conn()`. Las operaciones comunes (lookup sin borrados,
//! borrado lógico, unicidad, listados) se escriben una sola vez sobre un
//! `TableDescriptor` por tabla.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgConnection, PgPool, Postgres, QueryBuilder, Transaction};

use crate::config::database::{mask_database_url, DatabaseConfig};
use crate::database::{Database, UnitOfWork};
use crate::models::listing::{ListQuery, OrderBy, PageRequest, SortDirection};
use crate::utils::errors::{not_found_error, AppResult};

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        tracing::info!("🐘 Conectando a PostgreSQL en {}", mask_database_url(&config.url));
        let pool = config.create_pool().await?;
        Ok(Self { pool })
    }

    /// Ejecutar migraciones de la base de datos
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    pub(crate) fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Filtros específicos de una entidad que se agregan al `WHERE`
pub trait PgFilter {
    fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>);
}

/// Agrega `AND column = $n` cuando hay valor
pub fn push_eq<'a, T>(qb: &mut QueryBuilder<'a, Postgres>, column: &str, value: Option<T>)
where
    T: 'a + Send + sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres>,
{
    if let Some(value) = value {
        qb.push(format!(" AND {} = ", column)).push_bind(value);
    }
}

/// Descriptor explícito de una tabla con borrado lógico
pub struct TableDescriptor {
    pub table: &'static str,
    pub entity: &'static str,
    pub search_columns: &'static [&'static str],
    pub sort_columns: &'static [&'static str],
}

impl TableDescriptor {
    pub async fn find_active<T>(&self, conn: &mut PgConnection, id: i32) -> AppResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT * FROM {} WHERE id = $1 AND deleted_at IS NULL",
            self.table
        );
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    pub async fn soft_delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        let sql = format!(
            "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
            self.table
        );
        let result = sqlx::query(&sql).bind(id).execute(conn).await?;
        if result.rows_affected() == 0 {
            return Err(not_found_error(self.entity, id));
        }
        Ok(())
    }

    /// Valores de `column` ya usados por filas no borradas, en una sola consulta
    pub async fn values_in_use(
        &self,
        conn: &mut PgConnection,
        column: &str,
        values: &[String],
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<String>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {col} FROM {table} WHERE {col} = ANY($1) AND deleted_at IS NULL AND ($2::int IS NULL OR id <> $2)",
            col = column,
            table = self.table
        );
        let found = sqlx::query_scalar::<_, String>(&sql)
            .bind(values.to_vec())
            .bind(exclude_id)
            .fetch_all(conn)
            .await?;
        Ok(found)
    }

    pub async fn list<T, F, Q>(
        &self,
        conn: &mut PgConnection,
        filters: &F,
        query: &ListQuery<Q>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<T>, i64)>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        F: PgFilter + ?Sized,
    {
        let mut count_qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
            self.table
        ));
        filters.push_filters(&mut count_qb);
        self.push_search(&mut count_qb, query);
        let (total,): (i64,) = count_qb
            .build_query_as::<(i64,)>()
            .fetch_one(&mut *conn)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT * FROM {} WHERE deleted_at IS NULL",
            self.table
        ));
        filters.push_filters(&mut qb);
        self.push_search(&mut qb, query);
        self.push_order(&mut qb, &query.order_by);
        if let Some(page) = page {
            qb.push(" LIMIT ")
                .push_bind(page.limit())
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let rows = qb.build_query_as::<T>().fetch_all(&mut *conn).await?;
        Ok((rows, total))
    }

    fn push_search<Q>(&self, qb: &mut QueryBuilder<'_, Postgres>, query: &ListQuery<Q>) {
        let Some(pattern) = query.search_pattern() else {
            return;
        };
        if self.search_columns.is_empty() {
            return;
        }
        qb.push(" AND (");
        for (index, column) in self.search_columns.iter().enumerate() {
            if index > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("{} ILIKE ", column)).push_bind(pattern.clone());
        }
        qb.push(")");
    }

    fn push_order(&self, qb: &mut QueryBuilder<'_, Postgres>, order_by: &[OrderBy]) {
        qb.push(" ORDER BY ");
        for order in order_by {
            let column = order.field.column();
            // Columnas fuera del descriptor se ignoran en vez de romper la consulta
            if !self.sort_columns.contains(&column) {
                continue;
            }
            let direction = match order.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            qb.push(format!("{} {}, ", column, direction));
        }
        qb.push("id ASC");
    }
}
