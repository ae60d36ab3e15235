//! Configuración de base de datos
//!
//! Este módulo maneja la configuración del pool de PostgreSQL con SQLx.

use std::env;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::utils::errors::{AppError, AppResult};

/// Configuración de la base de datos
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> AppResult<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} must be a valid number", key))),
        None => Ok(default),
    }
}

impl DatabaseConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Configuration("DATABASE_URL must be set".to_string()))?;

        Ok(Self {
            url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), 10)?,
            min_connections: parse_or("DB_MIN_CONNECTIONS", lookup("DB_MIN_CONNECTIONS"), 1)?,
            connect_timeout: Duration::from_secs(parse_or(
                "DB_CONNECT_TIMEOUT_SECS",
                lookup("DB_CONNECT_TIMEOUT_SECS"),
                30,
            )?),
            idle_timeout: Duration::from_secs(parse_or(
                "DB_IDLE_TIMEOUT_SECS",
                lookup("DB_IDLE_TIMEOUT_SECS"),
                300,
            )?),
            max_lifetime: Duration::from_secs(3600),
        })
    }

    /// Crear un nuevo pool de conexiones
    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .connect(&self.url)
            .await
    }
}
