//! Modelo de ParkingSlot
//!
//! Un slot es una plaza física con tarifa por hora y categoría.
//! Su estado solo pasa a `occupied` / `available` a través del gestor de sesiones.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Estado del slot - mapea al ENUM slot_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "slot_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Occupied,
    Maintenance,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Occupied => "occupied",
            SlotStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SlotStatus::Available),
            "occupied" => Ok(SlotStatus::Occupied),
            "maintenance" => Ok(SlotStatus::Maintenance),
            other => Err(format!(
                "Invalid status '{}'. Must be available, occupied, or maintenance",
                other
            )),
        }
    }
}

/// Categoría del slot - mapea al ENUM slot_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash, Default)]
#[sqlx(type_name = "slot_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    #[default]
    Regular,
    Vip,
    Disabled,
}

impl SlotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotType::Regular => "regular",
            SlotType::Vip => "vip",
            SlotType::Disabled => "disabled",
        }
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(SlotType::Regular),
            "vip" => Ok(SlotType::Vip),
            "disabled" => Ok(SlotType::Disabled),
            other => Err(format!(
                "Invalid slot type '{}'. Must be regular, vip, or disabled",
                other
            )),
        }
    }
}

/// ParkingSlot - mapea exactamente a la tabla parking_slots
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ParkingSlot {
    pub slot_number: String,
    pub slot_type: SlotType,
    pub hourly_rate: Decimal,
    pub slot_status: SlotStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos para insertar un slot nuevo
#[derive(Debug, Clone)]
pub struct NewSlot {
    pub slot_number: String,
    pub slot_type: SlotType,
    pub hourly_rate: Decimal,
}

/// Filtros para listados de slots
#[derive(Debug, Clone, Default)]
pub struct SlotFilter {
    pub status: Option<SlotStatus>,
    pub slot_type: Option<SlotType>,
}

impl SlotFilter {
    pub fn matches(&self, slot: &ParkingSlot) -> bool {
        self.status.map_or(true, |s| slot.slot_status == s)
            && self.slot_type.map_or(true, |t| slot.slot_type == t)
    }
}
