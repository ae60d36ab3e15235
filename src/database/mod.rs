//! Módulo de base de datos
//!
//! Maneja la conexión con PostgreSQL

pub mod connection;

pub use connection::{close, connect, mask_database_url};
