//! Módulo de base de datos
//!
//! Define la unidad de trabajo transaccional sobre la que corren todos los
//! repositorios y sus dos backends: PostgreSQL (`postgres`) y memoria
//! (`memory`, para desarrollo local y tests).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::repositories::{
    node_repository::NodeRepository, pathway_option_repository::PathwayOptionRepository,
    pathway_repository::PathwayRepository, route_leg_repository::RouteLegRepository,
    route_repository::RouteRepository, toll_repository::TollRepository,
};
use crate::utils::errors::AppResult;

pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

/// Punto de entrada a la persistencia; se construye una vez en `main`
#[async_trait]
pub trait Database: Send + Sync {
    /// Abre una transacción. Todas las llamadas a repositorios hechas sobre
    /// la unidad devuelta comparten esa transacción.
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;

    fn backend_name(&self) -> &'static str;
}

/// Transacción abierta con acceso a todos los repositorios.
///
/// `commit` confirma; soltar la unidad sin confirmar hace rollback.
#[async_trait]
pub trait UnitOfWork:
    NodeRepository
    + PathwayRepository
    + PathwayOptionRepository
    + TollRepository
    + RouteRepository
    + RouteLegRepository
    + Send
{
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
