//! HTTP API for cache inspection and eviction

pub mod handlers;
pub mod models;
pub mod routes;

pub use routes::{AppState, create_router};
