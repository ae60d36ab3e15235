//! Informes de ocupación e ingresos
//!
//! Agregados de solo lectura sobre sesiones y pagos. Las fechas se interpretan
//! como días naturales UTC. Un rango sin datos produce ceros, nunca un error.
//!
//! Los totales los calcula el almacén (`COUNT`/`SUM`/`AVG` en PostgreSQL).
//! Las funciones puras de este módulo son la versión en memoria.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{
    Dashboard, DailyParkingRevenue, DailyPaymentRevenue, MethodRevenue, ParkingRecordDetails,
    ParkingStatistics, PaymentDetails, PaymentFilter, PaymentMethod, PaymentStatistics,
    PaymentStatus, RecordSearch, RecordStatus, SlotFilter,
};
use crate::repositories::ParkingStore;
use crate::services::clock::Clock;
use crate::services::slot_registry::slot_statistics;
use crate::utils::errors::AppResult;

/// Número de sesiones recientes mostradas en el panel
const RECENT_RECORDS_LIMIT: i64 = 10;

fn average(total: Decimal, count: i64) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(count)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Totales de sesiones. Las sesiones activas cuentan pero no suman ingresos.
pub fn summarize_records(records: &[ParkingRecordDetails]) -> ParkingStatistics {
    let mut stats = ParkingStatistics::default();
    let mut total_minutes = Decimal::ZERO;
    let mut timed = 0i64;

    for details in records {
        let record = &details.record;
        stats.total_records += 1;
        match record.status {
            RecordStatus::Active => stats.active_records += 1,
            RecordStatus::Completed => stats.completed_records += 1,
        }
        if let Some(amount) = record.total_amount {
            stats.total_revenue += amount;
        }
        if let Some(minutes) = record.duration_minutes {
            total_minutes += Decimal::from(minutes);
            timed += 1;
        }
    }

    stats.avg_duration_minutes = average(total_minutes, timed);
    stats
}

pub fn daily_parking_revenue(date: NaiveDate, stats: ParkingStatistics) -> DailyParkingRevenue {
    DailyParkingRevenue {
        date,
        total_parkings: stats.total_records,
        total_revenue: stats.total_revenue,
        avg_duration: stats.avg_duration_minutes,
    }
}

pub fn summarize_payments(payments: &[PaymentDetails]) -> PaymentStatistics {
    let mut stats = PaymentStatistics::default();

    for details in payments {
        let payment = &details.payment;
        stats.total_payments += 1;
        stats.total_amount += payment.amount_paid;
        match payment.payment_method {
            PaymentMethod::Cash => stats.cash_payments += payment.amount_paid,
            PaymentMethod::Card => stats.card_payments += payment.amount_paid,
            PaymentMethod::MobileMoney => stats.mobile_payments += payment.amount_paid,
        }
    }

    stats.average_amount = average(stats.total_amount, stats.total_payments);
    stats
}

/// Una fila por método de pago presente
pub fn revenue_by_method(payments: &[PaymentDetails]) -> Vec<MethodRevenue> {
    let mut by_method: BTreeMap<PaymentMethod, (i64, Decimal)> = BTreeMap::new();
    for details in payments {
        let entry = by_method
            .entry(details.payment.payment_method)
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += details.payment.amount_paid;
    }

    by_method
        .into_iter()
        .map(|(payment_method, (total_payments, total_revenue))| MethodRevenue {
            payment_method,
            total_payments,
            total_revenue,
        })
        .collect()
}

pub struct ReportingService {
    store: Arc<dyn ParkingStore>,
    clock: Arc<dyn Clock>,
}

impl ReportingService {
    pub fn new(store: Arc<dyn ParkingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Estadísticas de sesiones cuya entrada cae en `[date_from, date_to]`
    pub async fn parking_statistics(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> AppResult<ParkingStatistics> {
        let mut tx = self.store.begin().await?;
        let stats = tx
            .record_statistics(&RecordSearch {
                date_from,
                date_to,
                ..Default::default()
            })
            .await?;
        Ok(stats)
    }

    pub async fn daily_revenue(&self, date: NaiveDate) -> AppResult<DailyParkingRevenue> {
        let mut tx = self.store.begin().await?;
        let stats = tx.record_statistics(&RecordSearch::on_date(date)).await?;
        Ok(daily_parking_revenue(date, stats))
    }

    /// Solo cuentan los pagos completados
    pub async fn payment_statistics(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> AppResult<PaymentStatistics> {
        let mut tx = self.store.begin().await?;
        let stats = tx
            .payment_statistics(&PaymentFilter {
                status: Some(PaymentStatus::Completed),
                date_from,
                date_to,
                ..Default::default()
            })
            .await?;
        Ok(stats)
    }

    pub async fn daily_payment_revenue(&self, date: NaiveDate) -> AppResult<Vec<DailyPaymentRevenue>> {
        let mut tx = self.store.begin().await?;
        let rows = tx
            .revenue_by_method(&PaymentFilter {
                status: Some(PaymentStatus::Completed),
                date_from: Some(date),
                date_to: Some(date),
                ..Default::default()
            })
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| DailyPaymentRevenue {
                date,
                payment_method: row.payment_method,
                total_payments: row.total_payments,
                total_revenue: row.total_revenue,
            })
            .collect())
    }

    /// Panel del operador: ingresos de hoy, ocupación y actividad reciente
    pub async fn dashboard(&self) -> AppResult<Dashboard> {
        let today = self.clock.now().date_naive();
        let mut tx = self.store.begin().await?;

        let slots = tx.list_slots(&SlotFilter::default()).await?;
        let todays_stats = tx.record_statistics(&RecordSearch::on_date(today)).await?;
        let active_records = tx.list_records(&RecordSearch::active()).await?;
        let recent_records = tx
            .list_records(&RecordSearch {
                limit: Some(RECENT_RECORDS_LIMIT),
                ..Default::default()
            })
            .await?;

        Ok(Dashboard {
            today_revenue: daily_parking_revenue(today, todays_stats),
            slot_statistics: slot_statistics(&slots),
            active_parkings: active_records.len(),
            recent_records,
            active_records,
        })
    }
}
