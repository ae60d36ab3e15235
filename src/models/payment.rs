//! Modelo de Payment
//!
//! Un pago es un asiento financiero sobre una sesión ya cerrada. No modifica
//! ni la sesión ni el slot.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::slot::SlotType;

/// Método de pago - mapea al ENUM payment_method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MobileMoney => "mobile_money",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "mobile_money" => Ok(PaymentMethod::MobileMoney),
            other => Err(format!(
                "Invalid payment method '{}'. Must be cash, card, or mobile_money",
                other
            )),
        }
    }
}

/// Estado de liquidación - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Payment - mapea exactamente a la tabla payments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Payment {
    pub payment_id: i64,
    pub record_id: i64,
    pub amount_paid: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub receipt_number: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Datos para insertar un pago
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub record_id: i64,
    pub amount_paid: Decimal,
    pub payment_method: PaymentMethod,
    pub receipt_number: String,
    pub payment_date: DateTime<Utc>,
    pub created_by: Uuid,
}

/// Vista enriquecida con la sesión, el conductor y el slot
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct PaymentDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub payment: Payment,
    pub plate_number: Option<String>,
    pub slot_number: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub total_amount: Option<Decimal>,
    pub driver_name: Option<String>,
    pub phone_number: Option<String>,
    pub slot_type: Option<SlotType>,
}

/// Filtros para listados de pagos. Las fechas se comparan contra la fecha (UTC) del pago.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub record_id: Option<i64>,
    pub plate_number: Option<String>,
    pub status: Option<PaymentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl PaymentFilter {
    pub fn matches(&self, payment: &Payment, plate_number: Option<&str>) -> bool {
        let payment_day = payment.payment_date.date_naive();
        self.record_id.map_or(true, |id| payment.record_id == id)
            && self
                .plate_number
                .as_deref()
                .map_or(true, |p| plate_number == Some(p))
            && self.status.map_or(true, |s| payment.payment_status == s)
            && self.date_from.map_or(true, |d| payment_day >= d)
            && self.date_to.map_or(true, |d| payment_day <= d)
    }
}
