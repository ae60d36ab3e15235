//! Modelos de reportes
//!
//! Agregados de solo lectura sobre slots, sesiones y pagos.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::payment::PaymentMethod;
use super::session::ParkingRecordDetails;
use super::slot::ParkingSlot;

/// Conteos de slots por estado y por categoría
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SlotStatistics {
    pub total_slots: i64,
    pub available_slots: i64,
    pub occupied_slots: i64,
    pub maintenance_slots: i64,
    pub regular_slots: i64,
    pub vip_slots: i64,
    pub disabled_slots: i64,
}

/// Mapa de ocupación agrupado por sección (primer carácter del número de slot)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SlotMap {
    pub sections: BTreeMap<String, Vec<ParkingSlot>>,
    pub total_slots: usize,
    pub available_count: usize,
    pub occupied_count: usize,
    pub maintenance_count: usize,
}

/// Estadísticas de sesiones en un rango de fechas de entrada
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParkingStatistics {
    pub total_records: i64,
    pub active_records: i64,
    pub completed_records: i64,
    pub total_revenue: Decimal,
    pub avg_duration_minutes: Decimal,
}

/// Ingresos de sesiones para un día de entrada
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyParkingRevenue {
    pub date: NaiveDate,
    pub total_parkings: i64,
    pub total_revenue: Decimal,
    pub avg_duration: Decimal,
}

/// Estadísticas de pagos liquidados
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentStatistics {
    pub total_payments: i64,
    pub total_amount: Decimal,
    pub average_amount: Decimal,
    pub cash_payments: Decimal,
    pub card_payments: Decimal,
    pub mobile_payments: Decimal,
}

/// Una fila por método de pago y día
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyPaymentRevenue {
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub total_payments: i64,
    pub total_revenue: Decimal,
}

/// Totales de pagos de un método
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MethodRevenue {
    pub payment_method: PaymentMethod,
    pub total_payments: i64,
    pub total_revenue: Decimal,
}

/// Datos del panel principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub today_revenue: DailyParkingRevenue,
    pub slot_statistics: SlotStatistics,
    pub active_parkings: usize,
    pub recent_records: Vec<ParkingRecordDetails>,
    pub active_records: Vec<ParkingRecordDetails>,
}

/// Cabecera de la factura
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceCompany {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoicePayment {
    pub receipt_number: String,
    pub payment_date: DateTime<Utc>,
    pub amount_paid: Decimal,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceParking {
    pub plate_number: Option<String>,
    pub driver_name: Option<String>,
    pub phone_number: Option<String>,
    pub slot_number: Option<String>,
    pub slot_type: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration: String,
    pub total_amount: Option<Decimal>,
}

/// Factura legible para un pago
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub company: InvoiceCompany,
    pub payment: InvoicePayment,
    pub parking: InvoiceParking,
    pub processed_by: String,
    pub generated_at: DateTime<Utc>,
}
