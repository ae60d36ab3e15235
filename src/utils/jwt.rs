//! Utilidades JWT
//!
//! Emisión y verificación de tokens HS256 para operadores.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String, // operator_id
    pub username: String,
    pub exp: usize,
    pub iat: usize,
}

/// Generar token para un operador
pub fn issue_token(
    operator_id: Uuid,
    username: &str,
    secret: &str,
    issued_at: DateTime<Utc>,
    ttl: Duration,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: operator_id.to_string(),
        username: username.to_string(),
        exp: (issued_at + ttl).timestamp() as usize,
        iat: issued_at.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Error generando token: {}", e)))
}

/// Verificar y decodificar un token
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Token inválido".to_string()))
}
