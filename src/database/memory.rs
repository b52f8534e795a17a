//! Backend en memoria
//!
//! Cada `begin()` toma el mutex de las tablas y trabaja sobre una copia;
//! `commit` la publica y el drop la descarta. Con eso se obtiene el mismo
//! todo-o-nada que una transacción PostgreSQL (con transacciones serializadas).
//! Los índices únicos parciales se emulan en los repositorios.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::database::{Database, UnitOfWork};
use crate::models::{
    listing::{ListQuery, OrderBy, PageRequest, SortDirection, SortField},
    node::Node,
    pathway::Pathway,
    pathway_option::{PathwayOption, Toll},
    route::{Route, RouteLeg},
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    pub nodes: BTreeMap<i32, Node>,
    pub pathways: BTreeMap<i32, Pathway>,
    pub pathway_options: BTreeMap<i32, PathwayOption>,
    pub tolls: BTreeMap<i32, Toll>,
    pub routes: BTreeMap<i32, Route>,
    pub route_legs: BTreeMap<i32, RouteLeg>,
    sequences: BTreeMap<&'static str, i32>,
}

impl MemoryTables {
    /// Equivalente a una columna `serial`: nunca reutiliza ids
    pub fn next_id(&mut self, table: &'static str) -> i32 {
        let next = self.sequences.entry(table).or_insert(0);
        *next += 1;
        *next
    }
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<MemoryTables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let tables = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, tables }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryTables>,
    pub(crate) tables: MemoryTables,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryUnitOfWork { mut guard, tables } = *self;
        *guard = tables;
        Ok(())
    }
}

/// Error equivalente al de un índice único parcial de PostgreSQL
pub fn unique_violation(entity: &str, constraint: &str) -> AppError {
    AppError::Conflict(format!(
        "{} violates unique constraint {}",
        entity, constraint
    ))
}

/// Clave de orden para emular `ORDER BY`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

/// Fila con borrado lógico guardada en memoria
pub trait MemoryRecord: Clone {
    fn id(&self) -> i32;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn mark_deleted(&mut self, at: DateTime<Utc>);
    fn search_fields(&self) -> Vec<&str>;
    /// `None` cuando la tabla no tiene esa columna
    fn sort_key(&self, field: SortField) -> Option<SortKey>;

    fn is_live(&self) -> bool {
        self.deleted_at().is_none()
    }
}

pub fn find_live<T: MemoryRecord>(rows: &BTreeMap<i32, T>, id: i32) -> Option<T> {
    rows.get(&id).filter(|row| row.is_live()).cloned()
}

pub fn soft_delete_in<T: MemoryRecord>(
    rows: &mut BTreeMap<i32, T>,
    entity: &'static str,
    id: i32,
) -> AppResult<()> {
    match rows.get_mut(&id).filter(|row| row.is_live()) {
        Some(row) => {
            row.mark_deleted(Utc::now());
            Ok(())
        }
        None => Err(not_found_error(entity, id)),
    }
}

pub fn values_in_use<'a, T: MemoryRecord + 'a>(
    rows: impl Iterator<Item = &'a T>,
    value_of: impl Fn(&T) -> &str,
    values: &[String],
    exclude_id: Option<i32>,
) -> Vec<String> {
    rows.filter(|row| row.is_live() && Some(row.id()) != exclude_id)
        .map(|row| value_of(row).to_string())
        .filter(|value| values.contains(value))
        .collect()
}

pub fn list_records<'a, T: MemoryRecord + 'a, Q>(
    rows: impl Iterator<Item = &'a T>,
    predicate: impl Fn(&T) -> bool,
    query: &ListQuery<Q>,
    page: Option<PageRequest>,
) -> (Vec<T>, i64) {
    let mut matched: Vec<T> = rows
        .filter(|row| row.is_live() && predicate(row))
        .filter(|row| query.matches_search(&row.search_fields()))
        .cloned()
        .collect();

    matched.sort_by(|a, b| compare_records(a, b, &query.order_by));
    let total = matched.len() as i64;

    if let Some(page) = page {
        matched = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
    }

    (matched, total)
}

fn compare_records<T: MemoryRecord>(a: &T, b: &T, order_by: &[OrderBy]) -> Ordering {
    for order in order_by {
        if let (Some(left), Some(right)) = (a.sort_key(order.field), b.sort_key(order.field)) {
            let ordering = match order.direction {
                SortDirection::Asc => left.cmp(&right),
                SortDirection::Desc => right.cmp(&left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
    }
    a.id().cmp(&b.id())
}

macro_rules! memory_record {
    ($ty:ty, search: [$($search:ident),*], name: $name:expr, code: $code:expr) => {
        impl MemoryRecord for $ty {
            fn id(&self) -> i32 {
                self.id
            }

            fn deleted_at(&self) -> Option<DateTime<Utc>> {
                self.deleted_at
            }

            fn mark_deleted(&mut self, at: DateTime<Utc>) {
                self.deleted_at = Some(at);
                self.updated_at = at;
            }

            fn search_fields(&self) -> Vec<&str> {
                vec![$(self.$search.as_str()),*]
            }

            fn sort_key(&self, field: SortField) -> Option<SortKey> {
                let name: fn(&Self) -> Option<SortKey> = $name;
                let code: fn(&Self) -> Option<SortKey> = $code;
                match field {
                    SortField::Id => Some(SortKey::Int(self.id as i64)),
                    SortField::Name => name(self),
                    SortField::Code => code(self),
                    SortField::CreatedAt => Some(SortKey::Time(self.created_at)),
                    SortField::UpdatedAt => Some(SortKey::Time(self.updated_at)),
                }
            }
        }
    };
}

memory_record!(Node, search: [name, code],
    name: |n| Some(SortKey::Text(n.name.clone())),
    code: |n| Some(SortKey::Text(n.code.clone())));
memory_record!(Pathway, search: [name, code],
    name: |p| Some(SortKey::Text(p.name.clone())),
    code: |p| Some(SortKey::Text(p.code.clone())));
memory_record!(PathwayOption, search: [name],
    name: |o| Some(SortKey::Text(o.name.clone())),
    code: |_| None);
memory_record!(Route, search: [name, code],
    name: |r| Some(SortKey::Text(r.name.clone())),
    code: |r| Some(SortKey::Text(r.code.clone())));
memory_record!(RouteLeg, search: [],
    name: |_| None,
    code: |_| None);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::NewNode;
    use crate::repositories::node_repository::NodeRepository;

    fn new_node(code: &str) -> NewNode {
        NewNode {
            code: code.to_string(),
            name: format!("Terminal {}", code),
            latitude: 19.4,
            longitude: -99.1,
            allows_boarding: true,
            allows_alighting: true,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let db = MemoryDatabase::new();

        let mut uow = db.begin().await.unwrap();
        uow.create_node(new_node("ORIG")).await.unwrap();
        drop(uow);

        let mut uow = db.begin().await.unwrap();
        let (nodes, total) = uow
            .list_nodes(&ListQuery::default(), None)
            .await
            .unwrap();
        assert!(nodes.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let db = MemoryDatabase::new();

        let mut uow = db.begin().await.unwrap();
        let node = uow.create_node(new_node("ORIG")).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = db.begin().await.unwrap();
        assert_eq!(uow.find_node(node.id).await.unwrap(), Some(node));
    }

    #[test]
    fn test_sequences_never_reuse_ids() {
        let mut tables = MemoryTables::default();
        assert_eq!(tables.next_id("nodes"), 1);
        assert_eq!(tables.next_id("nodes"), 2);
        assert_eq!(tables.next_id("routes"), 1);
    }

    #[test]
    fn test_list_records_orders_and_pages() {
        let mut tables = MemoryTables::default();
        for code in ["CCC", "AAA", "BBB"] {
            let id = tables.next_id("nodes");
            let now = Utc::now();
            tables.nodes.insert(
                id,
                Node {
                    id,
                    code: code.to_string(),
                    name: code.to_lowercase(),
                    latitude: 0.0,
                    longitude: 0.0,
                    allows_boarding: true,
                    allows_alighting: true,
                    active: true,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                },
            );
        }
        soft_delete_in(&mut tables.nodes, "Node", 3).unwrap();

        let query: ListQuery<()> = ListQuery {
            filters: (),
            search_term: None,
            order_by: vec![OrderBy {
                field: SortField::Code,
                direction: SortDirection::Asc,
            }],
        };
        let (rows, total) = list_records(
            tables.nodes.values(),
            |_| true,
            &query,
            Some(PageRequest::new(Some(1), Some(1)).unwrap()),
        );
        assert_eq!(total, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, "AAA");
    }
}
