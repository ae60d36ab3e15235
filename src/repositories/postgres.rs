//! Almacén PostgreSQL
//!
//! Cada `PgTx` envuelve una `sqlx::Transaction`. Las lecturas previas a una
//! escritura usan `SELECT ... FOR UPDATE` para que dos entradas/salidas
//! concurrentes sobre el mismo slot, vehículo o sesión se serialicen.
//! Si el `PgTx` se descarta sin `commit`, sqlx hace rollback.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::{ParkingStore, StoreTx};
use crate::models::{
    Car, CarSearch, CarUpdate, MethodRevenue, NewCar, NewParkingRecord, NewPayment, NewSlot,
    ParkingRecord, ParkingRecordDetails, ParkingSlot, ParkingStatistics, Payment, PaymentDetails,
    PaymentFilter, PaymentStatistics, PaymentStatus, RecordCompletion, RecordSearch, SlotFilter,
    SlotStatus, SlotType,
};
use crate::utils::errors::{database_error, AppResult};

const RECORD_DETAILS_SELECT: &str = r#"
    SELECT
        pr.record_id, pr.plate_number, pr.slot_number, pr.entry_time, pr.exit_time,
        pr.duration_minutes, pr.total_amount, pr.status, pr.created_by,
        pr.created_at, pr.updated_at,
        c.driver_name, c.phone_number, c.car_model, c.car_color,
        ps.slot_type, ps.hourly_rate
    FROM parking_records pr
    LEFT JOIN cars c ON pr.plate_number = c.plate_number
    LEFT JOIN parking_slots ps ON pr.slot_number = ps.slot_number
"#;

const PAYMENT_DETAILS_SELECT: &str = r#"
    SELECT
        p.payment_id, p.record_id, p.amount_paid, p.payment_date, p.payment_method,
        p.payment_status, p.receipt_number, p.created_by, p.created_at,
        pr.plate_number, pr.slot_number, pr.entry_time, pr.exit_time, pr.total_amount,
        c.driver_name, c.phone_number,
        ps.slot_type
    FROM payments p
    LEFT JOIN parking_records pr ON p.record_id = pr.record_id
    LEFT JOIN cars c ON pr.plate_number = c.plate_number
    LEFT JOIN parking_slots ps ON pr.slot_number = ps.slot_number
"#;

const RECORD_STATISTICS_SELECT: &str = r#"
    SELECT
        COUNT(*) AS total_records,
        COUNT(*) FILTER (WHERE pr.status = 'active') AS active_records,
        COUNT(*) FILTER (WHERE pr.status = 'completed') AS completed_records,
        COALESCE(SUM(pr.total_amount), 0) AS total_revenue,
        COALESCE(ROUND(AVG(pr.duration_minutes), 2), 0) AS avg_duration_minutes
    FROM parking_records pr
"#;

const PAYMENT_STATISTICS_SELECT: &str = r#"
    SELECT
        COUNT(*) AS total_payments,
        COALESCE(SUM(p.amount_paid), 0) AS total_amount,
        COALESCE(ROUND(AVG(p.amount_paid), 2), 0) AS average_amount,
        COALESCE(SUM(p.amount_paid) FILTER (WHERE p.payment_method = 'cash'), 0) AS cash_payments,
        COALESCE(SUM(p.amount_paid) FILTER (WHERE p.payment_method = 'card'), 0) AS card_payments,
        COALESCE(SUM(p.amount_paid) FILTER (WHERE p.payment_method = 'mobile_money'), 0) AS mobile_payments
    FROM payments p
    LEFT JOIN parking_records pr ON p.record_id = pr.record_id
"#;

const REVENUE_BY_METHOD_SELECT: &str = r#"
    SELECT
        p.payment_method,
        COUNT(*) AS total_payments,
        COALESCE(SUM(p.amount_paid), 0) AS total_revenue
    FROM payments p
    LEFT JOIN parking_records pr ON p.record_id = pr.record_id
"#;

fn push_record_filters(query: &mut QueryBuilder<'_, Postgres>, search: &RecordSearch) {
    query.push(" WHERE 1=1");
    if let Some(plate) = &search.plate_number {
        query.push(" AND pr.plate_number LIKE ").push_bind(format!("%{}%", plate));
    }
    if let Some(plate) = &search.exact_plate {
        query.push(" AND pr.plate_number = ").push_bind(plate.clone());
    }
    if let Some(slot) = &search.slot_number {
        query.push(" AND pr.slot_number = ").push_bind(slot.clone());
    }
    if let Some(status) = search.status {
        query.push(" AND pr.status = ").push_bind(status);
    }
    if let Some(from) = search.date_from {
        query.push(" AND (pr.entry_time AT TIME ZONE 'UTC')::date >= ").push_bind(from);
    }
    if let Some(to) = search.date_to {
        query.push(" AND (pr.entry_time AT TIME ZONE 'UTC')::date <= ").push_bind(to);
    }
}

fn push_payment_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &PaymentFilter) {
    query.push(" WHERE 1=1");
    if let Some(record_id) = filter.record_id {
        query.push(" AND p.record_id = ").push_bind(record_id);
    }
    if let Some(plate) = &filter.plate_number {
        query.push(" AND pr.plate_number = ").push_bind(plate.clone());
    }
    if let Some(status) = filter.status {
        query.push(" AND p.payment_status = ").push_bind(status);
    }
    if let Some(from) = filter.date_from {
        query.push(" AND (p.payment_date AT TIME ZONE 'UTC')::date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        query.push(" AND (p.payment_date AT TIME ZONE 'UTC')::date <= ").push_bind(to);
    }
}

/// Almacén respaldado por un pool de PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParkingStore for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("Error starting transaction", e))?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn list_slots(&mut self, filter: &SlotFilter) -> AppResult<Vec<ParkingSlot>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM parking_slots WHERE 1=1");
        if let Some(status) = filter.status {
            query.push(" AND slot_status = ").push_bind(status);
        }
        if let Some(slot_type) = filter.slot_type {
            query.push(" AND slot_type = ").push_bind(slot_type);
        }
        query.push(" ORDER BY slot_number");

        query
            .build_query_as::<ParkingSlot>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error getting parking slots", e))
    }

    async fn find_slot(&mut self, slot_number: &str) -> AppResult<Option<ParkingSlot>> {
        sqlx::query_as::<_, ParkingSlot>("SELECT * FROM parking_slots WHERE slot_number = $1")
            .bind(slot_number)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error finding slot", e))
    }

    async fn lock_slot(&mut self, slot_number: &str) -> AppResult<Option<ParkingSlot>> {
        sqlx::query_as::<_, ParkingSlot>(
            "SELECT * FROM parking_slots WHERE slot_number = $1 FOR UPDATE",
        )
        .bind(slot_number)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error locking slot", e))
    }

    async fn insert_slot(&mut self, slot: NewSlot, now: DateTime<Utc>) -> AppResult<ParkingSlot> {
        sqlx::query_as::<_, ParkingSlot>(
            r#"
            INSERT INTO parking_slots (slot_number, slot_type, hourly_rate, slot_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(slot.slot_number)
        .bind(slot.slot_type)
        .bind(slot.hourly_rate)
        .bind(SlotStatus::Available)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error creating slot", e))
    }

    async fn update_slot(
        &mut self,
        slot_number: &str,
        slot_type: SlotType,
        hourly_rate: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ParkingSlot>> {
        sqlx::query_as::<_, ParkingSlot>(
            r#"
            UPDATE parking_slots
            SET slot_type = $2, hourly_rate = $3, updated_at = $4
            WHERE slot_number = $1
            RETURNING *
            "#,
        )
        .bind(slot_number)
        .bind(slot_type)
        .bind(hourly_rate)
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error updating slot", e))
    }

    async fn set_slot_status(
        &mut self,
        slot_number: &str,
        status: SlotStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ParkingSlot>> {
        sqlx::query_as::<_, ParkingSlot>(
            r#"
            UPDATE parking_slots
            SET slot_status = $2, updated_at = $3
            WHERE slot_number = $1
            RETURNING *
            "#,
        )
        .bind(slot_number)
        .bind(status)
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error updating slot status", e))
    }

    async fn delete_slot(&mut self, slot_number: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM parking_slots WHERE slot_number = $1")
            .bind(slot_number)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error deleting slot", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_cars(&mut self, search: &CarSearch) -> AppResult<Vec<Car>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM cars WHERE 1=1");
        if let Some(plate) = &search.plate_number {
            query.push(" AND plate_number LIKE ").push_bind(format!("%{}%", plate));
        }
        if let Some(driver) = &search.driver_name {
            query.push(" AND driver_name ILIKE ").push_bind(format!("%{}%", driver));
        }
        if let Some(phone) = &search.phone_number {
            query.push(" AND phone_number = ").push_bind(phone.clone());
        }
        query.push(" ORDER BY created_at DESC, plate_number");

        query
            .build_query_as::<Car>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error getting cars", e))
    }

    async fn find_car(&mut self, plate_number: &str) -> AppResult<Option<Car>> {
        sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE plate_number = $1")
            .bind(plate_number)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error finding car", e))
    }

    async fn lock_car(&mut self, plate_number: &str) -> AppResult<Option<Car>> {
        sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE plate_number = $1 FOR UPDATE")
            .bind(plate_number)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error locking car", e))
    }

    async fn insert_car(&mut self, car: NewCar, now: DateTime<Utc>) -> AppResult<Car> {
        sqlx::query_as::<_, Car>(
            r#"
            INSERT INTO cars (plate_number, driver_name, phone_number, car_model, car_color, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(car.plate_number)
        .bind(car.driver_name)
        .bind(car.phone_number)
        .bind(car.car_model)
        .bind(car.car_color)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error creating car", e))
    }

    async fn update_car(
        &mut self,
        plate_number: &str,
        update: CarUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Car>> {
        sqlx::query_as::<_, Car>(
            r#"
            UPDATE cars
            SET driver_name = $2, phone_number = $3, car_model = $4, car_color = $5, updated_at = $6
            WHERE plate_number = $1
            RETURNING *
            "#,
        )
        .bind(plate_number)
        .bind(update.driver_name)
        .bind(update.phone_number)
        .bind(update.car_model)
        .bind(update.car_color)
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error updating car", e))
    }

    async fn delete_car(&mut self, plate_number: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM cars WHERE plate_number = $1")
            .bind(plate_number)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error deleting car", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_record(
        &mut self,
        record: NewParkingRecord,
        now: DateTime<Utc>,
    ) -> AppResult<ParkingRecord> {
        sqlx::query_as::<_, ParkingRecord>(
            r#"
            INSERT INTO parking_records (plate_number, slot_number, entry_time, status, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, 'active', $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(record.plate_number)
        .bind(record.slot_number)
        .bind(record.entry_time)
        .bind(record.created_by)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error creating parking record", e))
    }

    async fn lock_record(&mut self, record_id: i64) -> AppResult<Option<ParkingRecord>> {
        sqlx::query_as::<_, ParkingRecord>(
            "SELECT * FROM parking_records WHERE record_id = $1 FOR UPDATE",
        )
        .bind(record_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error locking parking record", e))
    }

    async fn complete_record(
        &mut self,
        record_id: i64,
        completion: RecordCompletion,
        now: DateTime<Utc>,
    ) -> AppResult<ParkingRecord> {
        sqlx::query_as::<_, ParkingRecord>(
            r#"
            UPDATE parking_records
            SET exit_time = $2, duration_minutes = $3, total_amount = $4,
                status = 'completed', updated_at = $5
            WHERE record_id = $1
            RETURNING *
            "#,
        )
        .bind(record_id)
        .bind(completion.exit_time)
        .bind(completion.duration_minutes)
        .bind(completion.total_amount)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error completing parking record", e))
    }

    async fn find_record(&mut self, record_id: i64) -> AppResult<Option<ParkingRecordDetails>> {
        let mut query = QueryBuilder::<Postgres>::new(RECORD_DETAILS_SELECT);
        query.push(" WHERE pr.record_id = ").push_bind(record_id);

        query
            .build_query_as::<ParkingRecordDetails>()
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error finding record", e))
    }

    async fn list_records(&mut self, search: &RecordSearch) -> AppResult<Vec<ParkingRecordDetails>> {
        let mut query = QueryBuilder::<Postgres>::new(RECORD_DETAILS_SELECT);
        push_record_filters(&mut query, search);
        query.push(" ORDER BY pr.entry_time DESC, pr.record_id DESC");
        if let Some(limit) = search.limit {
            query.push(" LIMIT ").push_bind(limit);
        }

        query
            .build_query_as::<ParkingRecordDetails>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error getting parking records", e))
    }

    async fn has_active_record_for_car(&mut self, plate_number: &str) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM parking_records WHERE plate_number = $1 AND status = 'active')",
        )
        .bind(plate_number)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error checking active records for car", e))?;

        Ok(result.0)
    }

    async fn has_active_record_for_slot(&mut self, slot_number: &str) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM parking_records WHERE slot_number = $1 AND status = 'active')",
        )
        .bind(slot_number)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error checking active records for slot", e))?;

        Ok(result.0)
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (record_id, amount_paid, payment_date, payment_method, payment_status, receipt_number, created_by, created_at)
            VALUES ($1, $2, $3, $4, 'completed', $5, $6, $3)
            RETURNING *
            "#,
        )
        .bind(payment.record_id)
        .bind(payment.amount_paid)
        .bind(payment.payment_date)
        .bind(payment.payment_method)
        .bind(payment.receipt_number)
        .bind(payment.created_by)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error creating payment", e))
    }

    async fn find_payment(&mut self, payment_id: i64) -> AppResult<Option<PaymentDetails>> {
        let mut query = QueryBuilder::<Postgres>::new(PAYMENT_DETAILS_SELECT);
        query.push(" WHERE p.payment_id = ").push_bind(payment_id);

        query
            .build_query_as::<PaymentDetails>()
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error finding payment", e))
    }

    async fn find_payment_by_receipt(
        &mut self,
        receipt_number: &str,
    ) -> AppResult<Option<PaymentDetails>> {
        let mut query = QueryBuilder::<Postgres>::new(PAYMENT_DETAILS_SELECT);
        query
            .push(" WHERE p.receipt_number = ")
            .push_bind(receipt_number.to_string());

        query
            .build_query_as::<PaymentDetails>()
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error finding payment by receipt", e))
    }

    async fn list_payments(&mut self, filter: &PaymentFilter) -> AppResult<Vec<PaymentDetails>> {
        let mut query = QueryBuilder::<Postgres>::new(PAYMENT_DETAILS_SELECT);
        push_payment_filters(&mut query, filter);
        query.push(" ORDER BY p.payment_date DESC, p.payment_id DESC");

        query
            .build_query_as::<PaymentDetails>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error getting payments", e))
    }

    async fn update_payment_status(
        &mut self,
        payment_id: i64,
        status: PaymentStatus,
    ) -> AppResult<Option<Payment>> {
        sqlx::query_as::<_, Payment>(
            "UPDATE payments SET payment_status = $2 WHERE payment_id = $1 RETURNING *",
        )
        .bind(payment_id)
        .bind(status)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| database_error("Error updating payment status", e))
    }

    async fn delete_payment(&mut self, payment_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM payments WHERE payment_id = $1")
            .bind(payment_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error deleting payment", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_statistics(&mut self, search: &RecordSearch) -> AppResult<ParkingStatistics> {
        let mut query = QueryBuilder::<Postgres>::new(RECORD_STATISTICS_SELECT);
        push_record_filters(&mut query, search);

        let (total_records, active_records, completed_records, total_revenue, avg_duration_minutes) = query
            .build_query_as::<(i64, i64, i64, Decimal, Decimal)>()
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error computing parking statistics", e))?;

        Ok(ParkingStatistics {
            total_records,
            active_records,
            completed_records,
            total_revenue,
            avg_duration_minutes,
        })
    }

    async fn payment_statistics(&mut self, filter: &PaymentFilter) -> AppResult<PaymentStatistics> {
        let mut query = QueryBuilder::<Postgres>::new(PAYMENT_STATISTICS_SELECT);
        push_payment_filters(&mut query, filter);

        let (total_payments, total_amount, average_amount, cash_payments, card_payments, mobile_payments) =
            query
                .build_query_as::<(i64, Decimal, Decimal, Decimal, Decimal, Decimal)>()
                .fetch_one(&mut *self.tx)
                .await
                .map_err(|e| database_error("Error computing payment statistics", e))?;

        Ok(PaymentStatistics {
            total_payments,
            total_amount,
            average_amount,
            cash_payments,
            card_payments,
            mobile_payments,
        })
    }

    async fn revenue_by_method(&mut self, filter: &PaymentFilter) -> AppResult<Vec<MethodRevenue>> {
        let mut query = QueryBuilder::<Postgres>::new(REVENUE_BY_METHOD_SELECT);
        push_payment_filters(&mut query, filter);
        query.push(" GROUP BY p.payment_method ORDER BY p.payment_method");

        query
            .build_query_as::<MethodRevenue>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| database_error("Error computing revenue by payment method", e))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| database_error("Error committing transaction", e))
    }
}
