//! Middleware del sistema
//!
//! Autenticación de operadores y CORS.

pub mod auth;
pub mod cors;

pub use auth::{auth_middleware, AuthenticatedOperator};
pub use cors::cors_layer;
