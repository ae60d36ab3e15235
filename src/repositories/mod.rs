//! Capa de almacenamiento
//!
//! `ParkingStore` abre unidades de trabajo (`StoreTx`). Toda lectura y escritura
//! de un caso de uso ocurre dentro de una misma transacción: si el `StoreTx` se
//! descarta sin `commit`, se hace rollback. Así cada `?` que sale antes de tiempo
//! deja el almacén intacto.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{
    Car, CarSearch, CarUpdate, MethodRevenue, NewCar, NewParkingRecord, NewPayment, NewSlot,
    ParkingRecord, ParkingRecordDetails, ParkingSlot, ParkingStatistics, Payment, PaymentDetails,
    PaymentFilter, PaymentStatistics, PaymentStatus, RecordCompletion, RecordSearch, SlotFilter,
    SlotStatus, SlotType,
};
use crate::utils::errors::AppResult;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Cliente de almacenamiento inyectado en los servicios
#[async_trait]
pub trait ParkingStore: Send + Sync {
    /// Abre una transacción. Se revierte al descartarse sin `commit`.
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>>;
}

/// Unidad de trabajo transaccional
#[async_trait]
pub trait StoreTx: Send {
    // ---- Slots ----
    async fn list_slots(&mut self, filter: &SlotFilter) -> AppResult<Vec<ParkingSlot>>;
    async fn find_slot(&mut self, slot_number: &str) -> AppResult<Option<ParkingSlot>>;
    /// Lee el slot bloqueando la fila hasta el fin de la transacción
    async fn lock_slot(&mut self, slot_number: &str) -> AppResult<Option<ParkingSlot>>;
    async fn insert_slot(&mut self, slot: NewSlot, now: DateTime<Utc>) -> AppResult<ParkingSlot>;
    async fn update_slot(
        &mut self,
        slot_number: &str,
        slot_type: SlotType,
        hourly_rate: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ParkingSlot>>;
    async fn set_slot_status(
        &mut self,
        slot_number: &str,
        status: SlotStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ParkingSlot>>;
    async fn delete_slot(&mut self, slot_number: &str) -> AppResult<bool>;

    // ---- Vehículos ----
    async fn list_cars(&mut self, search: &CarSearch) -> AppResult<Vec<Car>>;
    async fn find_car(&mut self, plate_number: &str) -> AppResult<Option<Car>>;
    /// Lee el vehículo bloqueando la fila hasta el fin de la transacción
    async fn lock_car(&mut self, plate_number: &str) -> AppResult<Option<Car>>;
    async fn insert_car(&mut self, car: NewCar, now: DateTime<Utc>) -> AppResult<Car>;
    async fn update_car(
        &mut self,
        plate_number: &str,
        update: CarUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Car>>;
    async fn delete_car(&mut self, plate_number: &str) -> AppResult<bool>;

    // ---- Sesiones ----
    async fn insert_record(
        &mut self,
        record: NewParkingRecord,
        now: DateTime<Utc>,
    ) -> AppResult<ParkingRecord>;
    /// Lee la sesión bloqueando la fila hasta el fin de la transacción
    async fn lock_record(&mut self, record_id: i64) -> AppResult<Option<ParkingRecord>>;
    async fn complete_record(
        &mut self,
        record_id: i64,
        completion: RecordCompletion,
        now: DateTime<Utc>,
    ) -> AppResult<ParkingRecord>;
    async fn find_record(&mut self, record_id: i64) -> AppResult<Option<ParkingRecordDetails>>;
    /// Ordenado por hora de entrada descendente
    async fn list_records(&mut self, search: &RecordSearch) -> AppResult<Vec<ParkingRecordDetails>>;
    async fn has_active_record_for_car(&mut self, plate_number: &str) -> AppResult<bool>;
    async fn has_active_record_for_slot(&mut self, slot_number: &str) -> AppResult<bool>;

    // ---- Pagos ----
    async fn insert_payment(&mut self, payment: NewPayment) -> AppResult<Payment>;
    async fn find_payment(&mut self, payment_id: i64) -> AppResult<Option<PaymentDetails>>;
    async fn find_payment_by_receipt(&mut self, receipt_number: &str)
        -> AppResult<Option<PaymentDetails>>;
    /// Ordenado por fecha de pago descendente
    async fn list_payments(&mut self, filter: &PaymentFilter) -> AppResult<Vec<PaymentDetails>>;
    async fn update_payment_status(
        &mut self,
        payment_id: i64,
        status: PaymentStatus,
    ) -> AppResult<Option<Payment>>;
    async fn delete_payment(&mut self, payment_id: i64) -> AppResult<bool>;

    // ---- Agregados ----
    /// Conteos, ingresos y duración media de las sesiones filtradas
    async fn record_statistics(&mut self, search: &RecordSearch) -> AppResult<ParkingStatistics>;
    async fn payment_statistics(&mut self, filter: &PaymentFilter) -> AppResult<PaymentStatistics>;
    /// Una fila por método presente, en el orden de declaración del enum
    async fn revenue_by_method(&mut self, filter: &PaymentFilter) -> AppResult<Vec<MethodRevenue>>;

    /// Publica todos los cambios de la transacción de forma atómica
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
