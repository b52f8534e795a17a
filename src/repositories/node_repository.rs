use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use crate::database::memory::{
    find_live, list_records, soft_delete_in, unique_violation, values_in_use, MemoryUnitOfWork,
};
use crate::database::postgres::{push_eq, PgFilter, PgUnitOfWork, TableDescriptor};
use crate::models::listing::{ListQuery, PageRequest};
use crate::models::node::{NewNode, Node, NodeChanges, NodeFilters};
use crate::utils::errors::{map_unique_violation, not_found_error, AppResult};

pub const NODES: TableDescriptor = TableDescriptor {
    table: "nodes",
    entity: "Node",
    search_columns: &["name", "code"],
    sort_columns: &["id", "name", "code", "created_at", "updated_at"],
};

const CODE_CONSTRAINT: &str = "nodes_code_active_key";

#[async_trait]
pub trait NodeRepository: Send {
    async fn create_node(&mut self, node: NewNode) -> AppResult<Node>;

    /// Solo nodos no borrados
    async fn find_node(&mut self, id: i32) -> AppResult<Option<Node>>;

    async fn update_node(&mut self, id: i32, changes: NodeChanges) -> AppResult<Node>;

    async fn soft_delete_node(&mut self, id: i32) -> AppResult<()>;

    async fn list_nodes(
        &mut self,
        query: &ListQuery<NodeFilters>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<Node>, i64)>;

    async fn find_node_codes_in_use(
        &mut self,
        codes: &[String],
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<String>>;
}

impl PgFilter for NodeFilters {
    fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        push_eq(qb, "active", self.active);
        push_eq(qb, "allows_boarding", self.allows_boarding);
        push_eq(qb, "allows_alighting", self.allows_alighting);
    }
}

#[async_trait]
impl NodeRepository for PgUnitOfWork {
    async fn create_node(&mut self, node: NewNode) -> AppResult<Node> {
        sqlx::query_as::<_, Node>(
            r#"
            INSERT INTO nodes (code, name, latitude, longitude, allows_boarding, allows_alighting, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(node.code)
        .bind(node.name)
        .bind(node.latitude)
        .bind(node.longitude)
        .bind(node.allows_boarding)
        .bind(node.allows_alighting)
        .bind(node.active)
        .fetch_one(self.conn())
        .await
        .map_err(|e| map_unique_violation(e, "Node"))
    }

    async fn find_node(&mut self, id: i32) -> AppResult<Option<Node>> {
        NODES.find_active(self.conn(), id).await
    }

    async fn update_node(&mut self, id: i32, changes: NodeChanges) -> AppResult<Node> {
        sqlx::query_as::<_, Node>(
            r#"
            UPDATE nodes
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                latitude = COALESCE($4, latitude),
                longitude = COALESCE($5, longitude),
                allows_boarding = COALESCE($6, allows_boarding),
                allows_alighting = COALESCE($7, allows_alighting),
                active = COALESCE($8, active),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.code)
        .bind(changes.name)
        .bind(changes.latitude)
        .bind(changes.longitude)
        .bind(changes.allows_boarding)
        .bind(changes.allows_alighting)
        .bind(changes.active)
        .fetch_optional(self.conn())
        .await
        .map_err(|e| map_unique_violation(e, "Node"))?
        .ok_or_else(|| not_found_error("Node", id))
    }

    async fn soft_delete_node(&mut self, id: i32) -> AppResult<()> {
        NODES.soft_delete(self.conn(), id).await
    }

    async fn list_nodes(
        &mut self,
        query: &ListQuery<NodeFilters>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<Node>, i64)> {
        NODES.list(self.conn(), &query.filters, query, page).await
    }

    async fn find_node_codes_in_use(
        &mut self,
        codes: &[String],
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<String>> {
        NODES
            .values_in_use(self.conn(), "code", codes, exclude_id)
            .await
    }
}

#[async_trait]
impl NodeRepository for MemoryUnitOfWork {
    async fn create_node(&mut self, node: NewNode) -> AppResult<Node> {
        let tables = &mut self.tables;
        if tables
            .nodes
            .values()
            .any(|n| n.deleted_at.is_none() && n.code == node.code)
        {
            return Err(unique_violation("Node", CODE_CONSTRAINT));
        }

        let now = Utc::now();
        let row = Node {
            id: tables.next_id("nodes"),
            code: node.code,
            name: node.name,
            latitude: node.latitude,
            longitude: node.longitude,
            allows_boarding: node.allows_boarding,
            allows_alighting: node.allows_alighting,
            active: node.active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.nodes.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_node(&mut self, id: i32) -> AppResult<Option<Node>> {
        Ok(find_live(&self.tables.nodes, id))
    }

    async fn update_node(&mut self, id: i32, changes: NodeChanges) -> AppResult<Node> {
        let nodes = &mut self.tables.nodes;
        if let Some(code) = &changes.code {
            if nodes
                .values()
                .any(|n| n.deleted_at.is_none() && n.id != id && &n.code == code)
            {
                return Err(unique_violation("Node", CODE_CONSTRAINT));
            }
        }

        let node = nodes
            .get_mut(&id)
            .filter(|n| n.deleted_at.is_none())
            .ok_or_else(|| not_found_error("Node", id))?;
        changes.apply_to(node);
        node.updated_at = Utc::now();
        Ok(node.clone())
    }

    async fn soft_delete_node(&mut self, id: i32) -> AppResult<()> {
        soft_delete_in(&mut self.tables.nodes, "Node", id)
    }

    async fn list_nodes(
        &mut self,
        query: &ListQuery<NodeFilters>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<Node>, i64)> {
        Ok(list_records(
            self.tables.nodes.values(),
            |n| query.filters.matches(n),
            query,
            page,
        ))
    }

    async fn find_node_codes_in_use(
        &mut self,
        codes: &[String],
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<String>> {
        Ok(values_in_use(
            self.tables.nodes.values(),
            |n| n.code.as_str(),
            codes,
            exclude_id,
        ))
    }
}
