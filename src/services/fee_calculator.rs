//! Cálculo de tarifas
//!
//! Función pura: (entrada, salida, tarifa por hora) -> (minutos, importe).
//! Los minutos se redondean hacia arriba y cada fracción de hora se cobra
//! como hora completa.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

const MICROS_PER_MINUTE: i64 = 60_000_000;
const MINUTES_PER_HOUR: i64 = 60;

/// Resultado del cálculo de una estancia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParkingFee {
    pub duration_minutes: i64,
    pub billable_hours: i64,
    pub total_amount: Decimal,
}

/// Calcula duración e importe de una estancia.
///
/// `exit_time >= entry_time` es responsabilidad del llamador: la función no
/// recorta duraciones negativas.
pub fn calculate_parking_fee(
    entry_time: DateTime<Utc>,
    exit_time: DateTime<Utc>,
    hourly_rate: Decimal,
) -> ParkingFee {
    let elapsed = exit_time - entry_time;
    let micros = elapsed
        .num_microseconds()
        .unwrap_or_else(|| elapsed.num_milliseconds().saturating_mul(1_000));

    let duration_minutes = div_ceil(micros, MICROS_PER_MINUTE);
    let billable_hours = div_ceil(duration_minutes, MINUTES_PER_HOUR);

    ParkingFee {
        duration_minutes,
        billable_hours,
        total_amount: Decimal::from(billable_hours) * hourly_rate,
    }
}

/// Formato legible "Xh Ym" (truncado) usado en facturas
pub fn format_duration(entry_time: DateTime<Utc>, exit_time: DateTime<Utc>) -> String {
    let total_minutes = (exit_time - entry_time).num_minutes();
    format!("{}h {}m", total_minutes / MINUTES_PER_HOUR, total_minutes % MINUTES_PER_HOUR)
}

fn div_ceil(value: i64, divisor: i64) -> i64 {
    let quotient = value.div_euclid(divisor);
    if value.rem_euclid(divisor) != 0 {
        quotient + 1
    } else {
        quotient
    }
}
