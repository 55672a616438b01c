//! HTTP surface: router, health, static assets

pub mod routes;

pub use routes::build_router;
