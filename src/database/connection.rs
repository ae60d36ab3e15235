//! Conexión a PostgreSQL
//!
//! Apertura y cierre del pool, con la URL enmascarada en los logs.

use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::utils::errors::{database_error, AppResult};

/// Crear el pool y verificar que la conexión funciona
pub async fn connect(config: &DatabaseConfig) -> AppResult<PgPool> {
    info!("Conectando a la base de datos {}", mask_database_url(&config.url));

    let pool = config
        .create_pool()
        .await
        .map_err(|e| database_error("connecting to database", e))?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| database_error("checking database connection", e))?;

    info!(
        "Pool de conexiones listo (máx. {} conexiones)",
        config.max_connections
    );
    Ok(pool)
}

/// Cerrar el pool esperando a que terminen las conexiones en uso
pub async fn close(pool: &PgPool) {
    pool.close().await;
    info!("Pool de conexiones cerrado");
}

/// Función helper para enmascarar la URL de la base de datos en logs
pub fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
