//! Almacén en memoria
//!
//! Implementación de `ParkingStore` para tests y demos locales. Cada
//! transacción toma el cerrojo exclusivo de todo el conjunto de datos
//! (serializable por construcción), trabaja sobre una copia y la publica
//! en `commit`. Descartar la transacción descarta la copia.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{ParkingStore, StoreTx};
use crate::models::{
    Car, CarSearch, CarUpdate, MethodRevenue, NewCar, NewParkingRecord, NewPayment, NewSlot,
    ParkingRecord, ParkingRecordDetails, ParkingSlot, ParkingStatistics, Payment, PaymentDetails,
    PaymentFilter, PaymentStatistics, PaymentStatus, RecordCompletion, RecordSearch, RecordStatus,
    SlotFilter, SlotStatus, SlotType,
};
use crate::services::reporting::{revenue_by_method, summarize_payments, summarize_records};
use crate::utils::errors::{conflict_error, AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct MemoryData {
    slots: BTreeMap<String, ParkingSlot>,
    cars: BTreeMap<String, Car>,
    records: BTreeMap<i64, ParkingRecord>,
    payments: BTreeMap<i64, Payment>,
    last_record_id: i64,
    last_payment_id: i64,
}

impl MemoryData {
    fn record_details(&self, record: &ParkingRecord) -> ParkingRecordDetails {
        let car = self.cars.get(&record.plate_number);
        let slot = self.slots.get(&record.slot_number);
        ParkingRecordDetails {
            record: record.clone(),
            driver_name: car.map(|c| c.driver_name.clone()),
            phone_number: car.map(|c| c.phone_number.clone()),
            car_model: car.and_then(|c| c.car_model.clone()),
            car_color: car.and_then(|c| c.car_color.clone()),
            slot_type: slot.map(|s| s.slot_type),
            hourly_rate: slot.map(|s| s.hourly_rate),
        }
    }

    fn payment_details(&self, payment: &Payment) -> PaymentDetails {
        let record = self.records.get(&payment.record_id);
        let car = record.and_then(|r| self.cars.get(&r.plate_number));
        let slot = record.and_then(|r| self.slots.get(&r.slot_number));
        PaymentDetails {
            payment: payment.clone(),
            plate_number: record.map(|r| r.plate_number.clone()),
            slot_number: record.map(|r| r.slot_number.clone()),
            entry_time: record.map(|r| r.entry_time),
            exit_time: record.and_then(|r| r.exit_time),
            total_amount: record.and_then(|r| r.total_amount),
            driver_name: car.map(|c| c.driver_name.clone()),
            phone_number: car.map(|c| c.phone_number.clone()),
            slot_type: slot.map(|s| s.slot_type),
        }
    }

    /// Borra sesiones (y sus pagos) que cumplen el predicado, como ON DELETE CASCADE
    fn cascade_records<F: Fn(&ParkingRecord) -> bool>(&mut self, predicate: F) {
        let removed: Vec<i64> = self
            .records
            .values()
            .filter(|r| predicate(r))
            .map(|r| r.record_id)
            .collect();
        for id in &removed {
            self.records.remove(id);
        }
        self.payments.retain(|_, p| !removed.contains(&p.record_id));
    }
}

/// Almacén en memoria compartible entre tareas
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
    fail_commits: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simula un fallo del almacén en el momento del commit
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ParkingStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let guard = self.data.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            fail_commit: self.fail_commits.load(Ordering::SeqCst),
        }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryData>,
    working: MemoryData,
    fail_commit: bool,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn list_slots(&mut self, filter: &SlotFilter) -> AppResult<Vec<ParkingSlot>> {
        Ok(self
            .working
            .slots
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn find_slot(&mut self, slot_number: &str) -> AppResult<Option<ParkingSlot>> {
        Ok(self.working.slots.get(slot_number).cloned())
    }

    async fn lock_slot(&mut self, slot_number: &str) -> AppResult<Option<ParkingSlot>> {
        // El cerrojo global ya serializa la transacción completa
        Ok(self.working.slots.get(slot_number).cloned())
    }

    async fn insert_slot(&mut self, slot: NewSlot, now: DateTime<Utc>) -> AppResult<ParkingSlot> {
        if self.working.slots.contains_key(&slot.slot_number) {
            return Err(conflict_error("Parking slot", "number", &slot.slot_number));
        }
        let created = ParkingSlot {
            slot_number: slot.slot_number.clone(),
            slot_type: slot.slot_type,
            hourly_rate: slot.hourly_rate,
            slot_status: SlotStatus::Available,
            created_at: now,
            updated_at: now,
        };
        self.working.slots.insert(slot.slot_number, created.clone());
        Ok(created)
    }

    async fn update_slot(
        &mut self,
        slot_number: &str,
        slot_type: SlotType,
        hourly_rate: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ParkingSlot>> {
        Ok(self.working.slots.get_mut(slot_number).map(|slot| {
            slot.slot_type = slot_type;
            slot.hourly_rate = hourly_rate;
            slot.updated_at = now;
            slot.clone()
        }))
    }

    async fn set_slot_status(
        &mut self,
        slot_number: &str,
        status: SlotStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ParkingSlot>> {
        Ok(self.working.slots.get_mut(slot_number).map(|slot| {
            slot.slot_status = status;
            slot.updated_at = now;
            slot.clone()
        }))
    }

    async fn delete_slot(&mut self, slot_number: &str) -> AppResult<bool> {
        let removed = self.working.slots.remove(slot_number).is_some();
        if removed {
            self.working.cascade_records(|r| r.slot_number == slot_number);
        }
        Ok(removed)
    }

    async fn list_cars(&mut self, search: &CarSearch) -> AppResult<Vec<Car>> {
        let mut cars: Vec<Car> = self
            .working
            .cars
            .values()
            .filter(|c| search.matches(c))
            .cloned()
            .collect();
        cars.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.plate_number.cmp(&b.plate_number))
        });
        Ok(cars)
    }

    async fn find_car(&mut self, plate_number: &str) -> AppResult<Option<Car>> {
        Ok(self.working.cars.get(plate_number).cloned())
    }

    async fn lock_car(&mut self, plate_number: &str) -> AppResult<Option<Car>> {
        Ok(self.working.cars.get(plate_number).cloned())
    }

    async fn insert_car(&mut self, car: NewCar, now: DateTime<Utc>) -> AppResult<Car> {
        if self.working.cars.contains_key(&car.plate_number) {
            return Err(conflict_error("Car", "plate number", &car.plate_number));
        }
        let created = Car {
            plate_number: car.plate_number.clone(),
            driver_name: car.driver_name,
            phone_number: car.phone_number,
            car_model: car.car_model,
            car_color: car.car_color,
            created_at: now,
            updated_at: now,
        };
        self.working.cars.insert(car.plate_number, created.clone());
        Ok(created)
    }

    async fn update_car(
        &mut self,
        plate_number: &str,
        update: CarUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Car>> {
        Ok(self.working.cars.get_mut(plate_number).map(|car| {
            car.driver_name = update.driver_name;
            car.phone_number = update.phone_number;
            car.car_model = update.car_model;
            car.car_color = update.car_color;
            car.updated_at = now;
            car.clone()
        }))
    }

    async fn delete_car(&mut self, plate_number: &str) -> AppResult<bool> {
        let removed = self.working.cars.remove(plate_number).is_some();
        if removed {
            self.working.cascade_records(|r| r.plate_number == plate_number);
        }
        Ok(removed)
    }

    async fn insert_record(
        &mut self,
        record: NewParkingRecord,
        now: DateTime<Utc>,
    ) -> AppResult<ParkingRecord> {
        if !self.working.cars.contains_key(&record.plate_number) {
            return Err(AppError::Database(format!(
                "foreign key violation: car '{}' does not exist",
                record.plate_number
            )));
        }
        if !self.working.slots.contains_key(&record.slot_number) {
            return Err(AppError::Database(format!(
                "foreign key violation: slot '{}' does not exist",
                record.slot_number
            )));
        }
        self.working.last_record_id += 1;
        let created = ParkingRecord {
            record_id: self.working.last_record_id,
            plate_number: record.plate_number,
            slot_number: record.slot_number,
            entry_time: record.entry_time,
            exit_time: None,
            duration_minutes: None,
            total_amount: None,
            status: RecordStatus::Active,
            created_by: record.created_by,
            created_at: now,
            updated_at: now,
        };
        self.working.records.insert(created.record_id, created.clone());
        Ok(created)
    }

    async fn lock_record(&mut self, record_id: i64) -> AppResult<Option<ParkingRecord>> {
        Ok(self.working.records.get(&record_id).cloned())
    }

    async fn complete_record(
        &mut self,
        record_id: i64,
        completion: RecordCompletion,
        now: DateTime<Utc>,
    ) -> AppResult<ParkingRecord> {
        let record = self
            .working
            .records
            .get_mut(&record_id)
            .ok_or_else(|| AppError::Database(format!("record {} vanished during update", record_id)))?;
        record.exit_time = Some(completion.exit_time);
        record.duration_minutes = Some(completion.duration_minutes);
        record.total_amount = Some(completion.total_amount);
        record.status = RecordStatus::Completed;
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn find_record(&mut self, record_id: i64) -> AppResult<Option<ParkingRecordDetails>> {
        Ok(self
            .working
            .records
            .get(&record_id)
            .map(|r| self.working.record_details(r)))
    }

    async fn list_records(&mut self, search: &RecordSearch) -> AppResult<Vec<ParkingRecordDetails>> {
        let mut records: Vec<&ParkingRecord> = self
            .working
            .records
            .values()
            .filter(|r| search.matches(r))
            .collect();
        records.sort_by(|a, b| {
            b.entry_time
                .cmp(&a.entry_time)
                .then_with(|| b.record_id.cmp(&a.record_id))
        });
        if let Some(limit) = search.limit {
            records.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(records
            .into_iter()
            .map(|r| self.working.record_details(r))
            .collect())
    }

    async fn has_active_record_for_car(&mut self, plate_number: &str) -> AppResult<bool> {
        Ok(self
            .working
            .records
            .values()
            .any(|r| r.plate_number == plate_number && r.is_active()))
    }

    async fn has_active_record_for_slot(&mut self, slot_number: &str) -> AppResult<bool> {
        Ok(self
            .working
            .records
            .values()
            .any(|r| r.slot_number == slot_number && r.is_active()))
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> AppResult<Payment> {
        if !self.working.records.contains_key(&payment.record_id) {
            return Err(AppError::Database(format!(
                "foreign key violation: record {} does not exist",
                payment.record_id
            )));
        }
        if self
            .working
            .payments
            .values()
            .any(|p| p.receipt_number == payment.receipt_number)
        {
            return Err(conflict_error("Payment", "receipt number", &payment.receipt_number));
        }
        self.working.last_payment_id += 1;
        let created = Payment {
            payment_id: self.working.last_payment_id,
            record_id: payment.record_id,
            amount_paid: payment.amount_paid,
            payment_date: payment.payment_date,
            payment_method: payment.payment_method,
            payment_status: PaymentStatus::Completed,
            receipt_number: payment.receipt_number,
            created_by: payment.created_by,
            created_at: payment.payment_date,
        };
        self.working.payments.insert(created.payment_id, created.clone());
        Ok(created)
    }

    async fn find_payment(&mut self, payment_id: i64) -> AppResult<Option<PaymentDetails>> {
        Ok(self
            .working
            .payments
            .get(&payment_id)
            .map(|p| self.working.payment_details(p)))
    }

    async fn find_payment_by_receipt(
        &mut self,
        receipt_number: &str,
    ) -> AppResult<Option<PaymentDetails>> {
        Ok(self
            .working
            .payments
            .values()
            .find(|p| p.receipt_number == receipt_number)
            .map(|p| self.working.payment_details(p)))
    }

    async fn list_payments(&mut self, filter: &PaymentFilter) -> AppResult<Vec<PaymentDetails>> {
        let mut payments: Vec<PaymentDetails> = self
            .working
            .payments
            .values()
            .map(|p| self.working.payment_details(p))
            .filter(|d| filter.matches(&d.payment, d.plate_number.as_deref()))
            .collect();
        payments.sort_by(|a, b| {
            b.payment
                .payment_date
                .cmp(&a.payment.payment_date)
                .then_with(|| b.payment.payment_id.cmp(&a.payment.payment_id))
        });
        Ok(payments)
    }

    async fn update_payment_status(
        &mut self,
        payment_id: i64,
        status: PaymentStatus,
    ) -> AppResult<Option<Payment>> {
        Ok(self.working.payments.get_mut(&payment_id).map(|p| {
            p.payment_status = status;
            p.clone()
        }))
    }

    async fn delete_payment(&mut self, payment_id: i64) -> AppResult<bool> {
        Ok(self.working.payments.remove(&payment_id).is_some())
    }

    async fn record_statistics(&mut self, search: &RecordSearch) -> AppResult<ParkingStatistics> {
        let search = RecordSearch {
            limit: None,
            ..search.clone()
        };
        let records = self.list_records(&search).await?;
        Ok(summarize_records(&records))
    }

    async fn payment_statistics(&mut self, filter: &PaymentFilter) -> AppResult<PaymentStatistics> {
        let payments = self.list_payments(filter).await?;
        Ok(summarize_payments(&payments))
    }

    async fn revenue_by_method(&mut self, filter: &PaymentFilter) -> AppResult<Vec<MethodRevenue>> {
        let payments = self.list_payments(filter).await?;
        Ok(revenue_by_method(&payments))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx {
            mut guard,
            working,
            fail_commit,
        } = *self;
        if fail_commit {
            return Err(AppError::Database("simulated commit failure".to_string()));
        }
        *guard = working;
        Ok(())
    }
}
