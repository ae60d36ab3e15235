//! SmartPark backend
//!
//! Núcleo de un aparcamiento: registro de slots, sesiones de entrada y salida,
//! cálculo de tarifas, conciliación de pagos e informes.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
