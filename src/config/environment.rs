//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Las variables se leen a través de una función de búsqueda para poder
//! probar la carga sin tocar el entorno del proceso.

use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::models::{InvoiceCompany, PaymentMethod, SlotType};
use crate::services::SlotDefaults;
use crate::utils::errors::{AppError, AppResult};

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub company_name: String,
    pub company_location: String,
    pub default_payment_method: PaymentMethod,
    pub default_hourly_rate: Decimal,
    pub default_slot_type: SlotType,
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>, default: T) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) if !value.trim().is_empty() => value.trim().parse().map_err(|e| {
            AppError::Configuration(format!("{} has an invalid value '{}': {}", key, value, e))
        }),
        _ => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Cargar desde las variables de entorno del proceso
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Configuration("JWT_SECRET must be set".to_string()))?;

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            port: parse_var("PORT", lookup("PORT"), 3000)?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            jwt_secret,
            cors_origins,
            company_name: lookup("COMPANY_NAME").unwrap_or_else(|| "SmartPark".to_string()),
            company_location: lookup("COMPANY_LOCATION").unwrap_or_else(|| "Kigali, Rwanda".to_string()),
            default_payment_method: parse_var(
                "DEFAULT_PAYMENT_METHOD",
                lookup("DEFAULT_PAYMENT_METHOD"),
                PaymentMethod::Cash,
            )?,
            default_hourly_rate: parse_var(
                "DEFAULT_HOURLY_RATE",
                lookup("DEFAULT_HOURLY_RATE"),
                Decimal::new(100_000, 2),
            )?,
            default_slot_type: parse_var(
                "DEFAULT_SLOT_TYPE",
                lookup("DEFAULT_SLOT_TYPE"),
                SlotType::Regular,
            )?,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn slot_defaults(&self) -> SlotDefaults {
        SlotDefaults {
            slot_type: self.default_slot_type,
            hourly_rate: self.default_hourly_rate,
        }
    }

    pub fn invoice_company(&self) -> InvoiceCompany {
        InvoiceCompany {
            name: self.company_name.clone(),
            location: self.company_location.clone(),
        }
    }
}
