//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Vehicle already parked: {0}")]
    VehicleAlreadyParked(String),

    #[error("Session not active: {0}")]
    SessionNotActive(String),

    #[error("Insufficient payment: paid {paid}, due {due}")]
    InsufficientPayment { due: Decimal, paid: Decimal },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Código estable expuesto en el cuerpo de la respuesta
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::SlotUnavailable(_) => "SLOT_UNAVAILABLE",
            AppError::VehicleAlreadyParked(_) => "VEHICLE_ALREADY_PARKED",
            AppError::SessionNotActive(_) => "SESSION_NOT_ACTIVE",
            AppError::InsufficientPayment { .. } => "INSUFFICIENT_PAYMENT",
            AppError::Conflict(_) => "CONFLICT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SlotUnavailable(_)
            | AppError::VehicleAlreadyParked(_)
            | AppError::SessionNotActive(_)
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InsufficientPayment { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code().to_string();

        let error_response = match self {
            AppError::Database(msg) => {
                error!("Database error: {}", msg);
                ErrorResponse {
                    error: "Database Error".to_string(),
                    message: "An error occurred while accessing the database".to_string(),
                    details: None,
                    code,
                }
            }

            AppError::Validation(e) => {
                warn!("Validation error: {}", e);
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    code,
                }
            }

            AppError::InsufficientPayment { due, paid } => {
                warn!("Insufficient payment: paid {} < due {}", paid, due);
                ErrorResponse {
                    error: "Insufficient Payment".to_string(),
                    message: "Payment amount is less than total amount due".to_string(),
                    details: Some(json!({
                        "amount_due": due.to_string(),
                        "amount_paid": paid.to_string(),
                    })),
                    code,
                }
            }

            AppError::Configuration(msg) | AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "An unexpected error occurred".to_string(),
                    details: None,
                    code,
                }
            }

            AppError::Unauthorized(msg) => {
                warn!("Unauthorized access: {}", msg);
                ErrorResponse {
                    error: "Unauthorized".to_string(),
                    message: msg,
                    details: None,
                    code,
                }
            }

            AppError::NotFound(msg) => ErrorResponse {
                error: "Not Found".to_string(),
                message: msg,
                details: None,
                code,
            },

            AppError::BadRequest(msg) => ErrorResponse {
                error: "Bad Request".to_string(),
                message: msg,
                details: None,
                code,
            },

            AppError::SlotUnavailable(msg)
            | AppError::VehicleAlreadyParked(msg)
            | AppError::SessionNotActive(msg)
            | AppError::Conflict(msg) => {
                warn!("Conflict ({}): {}", code, msg);
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message: msg,
                    details: None,
                    code,
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para envolver errores de SQLx con contexto
pub fn database_error(context: &str, err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        // 23505 = unique_violation
        if db_err.code().as_deref() == Some("23505") {
            return AppError::Conflict(format!("{}: {}", context, db_err.message()));
        }
    }
    AppError::Database(format!("{}: {}", context, err))
}
