//! Modelo de ParkingRecord (sesión de aparcamiento)
//!
//! Una sesión nace `active` en la entrada y termina `completed` en la salida.
//! La duración y el importe se calculan una sola vez, al cerrar.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::slot::SlotType;

/// Estado de la sesión - mapea al ENUM record_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "record_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Completed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RecordStatus::Active),
            "completed" => Ok(RecordStatus::Completed),
            other => Err(format!("Invalid record status '{}'. Must be active or completed", other)),
        }
    }
}

/// ParkingRecord - mapea exactamente a la tabla parking_records
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ParkingRecord {
    pub record_id: i64,
    pub plate_number: String,
    pub slot_number: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub total_amount: Option<Decimal>,
    pub status: RecordStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingRecord {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }
}

/// Datos para abrir una sesión
#[derive(Debug, Clone)]
pub struct NewParkingRecord {
    pub plate_number: String,
    pub slot_number: String,
    pub entry_time: DateTime<Utc>,
    pub created_by: Uuid,
}

/// Resultado del cierre que se persiste sobre la sesión
#[derive(Debug, Clone)]
pub struct RecordCompletion {
    pub exit_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub total_amount: Decimal,
}

/// Vista enriquecida con datos del conductor y del slot
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ParkingRecordDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub record: ParkingRecord,
    pub driver_name: Option<String>,
    pub phone_number: Option<String>,
    pub car_model: Option<String>,
    pub car_color: Option<String>,
    pub slot_type: Option<SlotType>,
    pub hourly_rate: Option<Decimal>,
}

/// Filtros de búsqueda de sesiones. Las fechas se comparan contra la fecha (UTC) de entrada.
#[derive(Debug, Clone, Default)]
pub struct RecordSearch {
    /// Coincidencia parcial
    pub plate_number: Option<String>,
    /// Coincidencia exacta (historial de un vehículo)
    pub exact_plate: Option<String>,
    pub slot_number: Option<String>,
    pub status: Option<RecordStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Máximo de filas devueltas por `list_records`; los agregados lo ignoran
    pub limit: Option<i64>,
}

impl RecordSearch {
    pub fn active() -> Self {
        Self {
            status: Some(RecordStatus::Active),
            ..Default::default()
        }
    }

    /// Sesiones con entrada en el día indicado
    pub fn on_date(date: NaiveDate) -> Self {
        Self {
            date_from: Some(date),
            date_to: Some(date),
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &ParkingRecord) -> bool {
        let entry_date = record.entry_time.date_naive();
        self.plate_number
            .as_deref()
            .map_or(true, |p| record.plate_number.contains(p))
            && self
                .exact_plate
                .as_deref()
                .map_or(true, |p| record.plate_number == p)
            && self
                .slot_number
                .as_deref()
                .map_or(true, |s| record.slot_number == s)
            && self.status.map_or(true, |s| record.status == s)
            && self.date_from.map_or(true, |d| entry_date >= d)
            && self.date_to.map_or(true, |d| entry_date <= d)
    }
}
