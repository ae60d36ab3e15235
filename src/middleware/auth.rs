//! Middleware de autenticación JWT
//!
//! Este módulo maneja la extracción del token Bearer y la verificación del
//! operador autenticado. El operador se inyecta en las extensions de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{state::AppState, utils::errors::AppError, utils::jwt::decode_token};

/// Operador autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedOperator {
    pub operator_id: Uuid,
    pub username: String,
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_str| auth_str.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let claims = decode_token(token, &state.config.jwt_secret)?;

    let operator_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("ID de operador inválido".to_string()))?;

    request.extensions_mut().insert(AuthenticatedOperator {
        operator_id,
        username: claims.username,
    });

    Ok(next.run(request).await)
}
