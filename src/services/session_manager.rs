//! Gestor de sesiones de aparcamiento
//!
//! Máquina de estados `active -> completed`. La entrada y la salida se
//! ejecutan cada una en una única transacción: las precondiciones se leen con
//! bloqueo de fila y los efectos (sesión + estado del slot) se publican juntos
//! en el `commit`. Cualquier error antes del `commit` descarta la transacción.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    NewCar, NewParkingRecord, ParkingRecord, ParkingRecordDetails, RecordCompletion, RecordSearch,
    SlotStatus,
};
use crate::repositories::ParkingStore;
use crate::services::clock::Clock;
use crate::services::fee_calculator::calculate_parking_fee;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Datos del propietario, obligatorios solo para vehículos nuevos
#[derive(Debug, Clone)]
pub struct OwnerDetails {
    pub driver_name: String,
    pub phone_number: String,
    pub car_model: Option<String>,
    pub car_color: Option<String>,
}

/// Entrada de un vehículo
#[derive(Debug, Clone)]
pub struct CarEntry {
    pub plate_number: String,
    pub slot_number: String,
    pub owner: Option<OwnerDetails>,
    /// Por defecto, el instante actual del reloj
    pub entry_time: Option<DateTime<Utc>>,
}

pub struct SessionManager {
    store: Arc<dyn ParkingStore>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn ParkingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Abre una sesión (entrada del vehículo) y marca el slot como ocupado
    pub async fn open_session(&self, entry: CarEntry, operator_id: Uuid) -> AppResult<ParkingRecord> {
        let now = self.clock.now();
        let entry_time = entry.entry_time.unwrap_or(now);

        let mut tx = self.store.begin().await?;

        let slot = tx
            .lock_slot(&entry.slot_number)
            .await?
            .ok_or_else(|| not_found_error("Parking slot", &entry.slot_number))?;

        if slot.slot_status != SlotStatus::Available {
            return Err(AppError::SlotUnavailable(format!(
                "Slot '{}' is {}",
                slot.slot_number, slot.slot_status
            )));
        }
        // Un override administrativo puede haber liberado el slot con una sesión abierta
        if tx.has_active_record_for_slot(&slot.slot_number).await? {
            return Err(AppError::SlotUnavailable(format!(
                "Slot '{}' already has an active parking record",
                slot.slot_number
            )));
        }

        let car = match tx.lock_car(&entry.plate_number).await? {
            Some(car) => car,
            None => {
                let owner = entry.owner.ok_or_else(|| {
                    AppError::BadRequest(
                        "Driver name and phone number are required for new cars".to_string(),
                    )
                })?;
                debug!("Registrando vehículo nuevo {} en la entrada", entry.plate_number);
                tx.insert_car(
                    NewCar {
                        plate_number: entry.plate_number.clone(),
                        driver_name: owner.driver_name,
                        phone_number: owner.phone_number,
                        car_model: owner.car_model,
                        car_color: owner.car_color,
                    },
                    now,
                )
                .await?
            }
        };

        if tx.has_active_record_for_car(&car.plate_number).await? {
            return Err(AppError::VehicleAlreadyParked(format!(
                "Car '{}' is already parked",
                car.plate_number
            )));
        }

        let record = tx
            .insert_record(
                NewParkingRecord {
                    plate_number: car.plate_number,
                    slot_number: slot.slot_number.clone(),
                    entry_time,
                    created_by: operator_id,
                },
                now,
            )
            .await?;
        tx.set_slot_status(&slot.slot_number, SlotStatus::Occupied, now)
            .await?;
        tx.commit().await?;

        info!(
            "Entrada registrada: sesión {} ({} en {})",
            record.record_id, record.plate_number, record.slot_number
        );
        Ok(record)
    }

    /// Cierra una sesión activa (salida), calcula el importe y libera el slot
    pub async fn close_session(
        &self,
        record_id: i64,
        exit_time: Option<DateTime<Utc>>,
    ) -> AppResult<ParkingRecord> {
        let now = self.clock.now();
        let exit_time = exit_time.unwrap_or(now);

        let mut tx = self.store.begin().await?;

        let record = tx
            .lock_record(record_id)
            .await?
            .filter(ParkingRecord::is_active)
            .ok_or_else(|| {
                AppError::SessionNotActive(format!("Active parking record {} not found", record_id))
            })?;

        if exit_time < record.entry_time {
            return Err(AppError::BadRequest(format!(
                "Exit time {} is earlier than entry time {}",
                exit_time.to_rfc3339(),
                record.entry_time.to_rfc3339()
            )));
        }

        let slot = tx.lock_slot(&record.slot_number).await?.ok_or_else(|| {
            AppError::Database(format!(
                "Slot '{}' referenced by record {} does not exist",
                record.slot_number, record_id
            ))
        })?;

        let fee = calculate_parking_fee(record.entry_time, exit_time, slot.hourly_rate);

        let completed = tx
            .complete_record(
                record_id,
                RecordCompletion {
                    exit_time,
                    duration_minutes: fee.duration_minutes,
                    total_amount: fee.total_amount,
                },
                now,
            )
            .await?;
        tx.set_slot_status(&slot.slot_number, SlotStatus::Available, now)
            .await?;
        tx.commit().await?;

        info!(
            "Salida registrada: sesión {} ({} min, {} h facturables, importe {})",
            record_id, fee.duration_minutes, fee.billable_hours, fee.total_amount
        );
        Ok(completed)
    }

    pub async fn get_record(&self, record_id: i64) -> AppResult<ParkingRecordDetails> {
        let mut tx = self.store.begin().await?;
        tx.find_record(record_id)
            .await?
            .ok_or_else(|| not_found_error("Parking record", &record_id.to_string()))
    }

    /// Búsqueda de sesiones, más recientes primero
    pub async fn search_records(&self, search: RecordSearch) -> AppResult<Vec<ParkingRecordDetails>> {
        let mut tx = self.store.begin().await?;
        let records = tx.list_records(&search).await?;
        Ok(records)
    }

    pub async fn active_records(&self) -> AppResult<Vec<ParkingRecordDetails>> {
        self.search_records(RecordSearch::active()).await
    }
}
