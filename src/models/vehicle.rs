//! Modelo de Car
//!
//! Vehículo identificado por su matrícula (sensible a mayúsculas tal como se guarda).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Car - mapea exactamente a la tabla cars
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Car {
    pub plate_number: String,
    pub driver_name: String,
    pub phone_number: String,
    pub car_model: Option<String>,
    pub car_color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos para registrar un vehículo
#[derive(Debug, Clone)]
pub struct NewCar {
    pub plate_number: String,
    pub driver_name: String,
    pub phone_number: String,
    pub car_model: Option<String>,
    pub car_color: Option<String>,
}

/// Campos editables de un vehículo
#[derive(Debug, Clone)]
pub struct CarUpdate {
    pub driver_name: String,
    pub phone_number: String,
    pub car_model: Option<String>,
    pub car_color: Option<String>,
}

/// Criterios de búsqueda (coincidencia parcial en matrícula y conductor, exacta en teléfono)
#[derive(Debug, Clone, Default)]
pub struct CarSearch {
    pub plate_number: Option<String>,
    pub driver_name: Option<String>,
    pub phone_number: Option<String>,
}

impl CarSearch {
    pub fn matches(&self, car: &Car) -> bool {
        self.plate_number
            .as_deref()
            .map_or(true, |p| car.plate_number.contains(p))
            && self
                .driver_name
                .as_deref()
                .map_or(true, |d| car.driver_name.to_lowercase().contains(&d.to_lowercase()))
            && self
                .phone_number
                .as_deref()
                .map_or(true, |p| car.phone_number == p)
    }
}
