//! Repositorios de acceso a datos
//!
//! Un trait por entidad, implementado tanto sobre la transacción de
//! PostgreSQL como sobre el backend en memoria.

pub mod node_repository;
pub mod pathway_option_repository;
pub mod pathway_repository;
pub mod route_leg_repository;
pub mod route_repository;
pub mod toll_repository;

pub use node_repository::NodeRepository;
pub use pathway_option_repository::PathwayOptionRepository;
pub use pathway_repository::PathwayRepository;
pub use route_leg_repository::RouteLegRepository;
pub use route_repository::RouteRepository;
pub use toll_repository::TollRepository;
