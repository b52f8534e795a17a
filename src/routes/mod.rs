//! Routers HTTP
//!
//! Un router por entidad; `create_app` los anida bajo `/api`.

pub mod node_routes;
pub mod pathway_routes;
pub mod route_routes;
