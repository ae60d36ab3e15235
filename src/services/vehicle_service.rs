//! Registro de vehículos
//!
//! CRUD de vehículos más historial y estado de aparcamiento. Un vehículo con
//! sesión activa no puede eliminarse.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::models::{
    Car, CarSearch, CarUpdate, NewCar, ParkingRecordDetails, PaymentDetails, PaymentFilter,
    RecordSearch,
};
use crate::repositories::ParkingStore;
use crate::services::clock::Clock;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Sesión del historial con los pagos registrados sobre ella
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: ParkingRecordDetails,
    pub payments: Vec<PaymentDetails>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarHistory {
    pub car: Car,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarParkingStatus {
    pub car: Car,
    pub is_parked: bool,
    pub current_parking: Option<ParkingRecordDetails>,
}

pub struct VehicleService {
    store: Arc<dyn ParkingStore>,
    clock: Arc<dyn Clock>,
}

impl VehicleService {
    pub fn new(store: Arc<dyn ParkingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create(&self, car: NewCar) -> AppResult<Car> {
        let mut tx = self.store.begin().await?;
        let created = tx.insert_car(car, self.clock.now()).await?;
        tx.commit().await?;

        info!("Vehículo {} registrado", created.plate_number);
        Ok(created)
    }

    pub async fn get(&self, plate_number: &str) -> AppResult<Car> {
        let mut tx = self.store.begin().await?;
        tx.find_car(plate_number)
            .await?
            .ok_or_else(|| not_found_error("Car", plate_number))
    }

    /// Listado, más recientes primero. Una búsqueda vacía devuelve todos.
    pub async fn search(&self, search: CarSearch) -> AppResult<Vec<Car>> {
        let mut tx = self.store.begin().await?;
        let cars = tx.list_cars(&search).await?;
        Ok(cars)
    }

    pub async fn update(&self, plate_number: &str, update: CarUpdate) -> AppResult<Car> {
        let mut tx = self.store.begin().await?;
        let car = tx
            .update_car(plate_number, update, self.clock.now())
            .await?
            .ok_or_else(|| not_found_error("Car", plate_number))?;
        tx.commit().await?;
        Ok(car)
    }

    pub async fn delete(&self, plate_number: &str) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        tx.lock_car(plate_number)
            .await?
            .ok_or_else(|| not_found_error("Car", plate_number))?;

        if tx.has_active_record_for_car(plate_number).await? {
            return Err(AppError::Conflict(format!(
                "Cannot delete car '{}' with active parking records",
                plate_number
            )));
        }

        tx.delete_car(plate_number).await?;
        tx.commit().await?;

        info!("Vehículo {} eliminado", plate_number);
        Ok(())
    }

    pub async fn history(&self, plate_number: &str) -> AppResult<CarHistory> {
        let mut tx = self.store.begin().await?;
        let car = tx
            .find_car(plate_number)
            .await?
            .ok_or_else(|| not_found_error("Car", plate_number))?;

        let records = tx
            .list_records(&RecordSearch {
                exact_plate: Some(plate_number.to_string()),
                ..Default::default()
            })
            .await?;
        let payments = tx
            .list_payments(&PaymentFilter {
                plate_number: Some(plate_number.to_string()),
                ..Default::default()
            })
            .await?;

        let mut by_record: HashMap<i64, Vec<PaymentDetails>> = HashMap::new();
        for payment in payments {
            by_record.entry(payment.payment.record_id).or_default().push(payment);
        }

        let history = records
            .into_iter()
            .map(|record| {
                let payments = by_record.remove(&record.record.record_id).unwrap_or_default();
                HistoryEntry { record, payments }
            })
            .collect();

        Ok(CarHistory { car, history })
    }

    pub async fn parking_status(&self, plate_number: &str) -> AppResult<CarParkingStatus> {
        let mut tx = self.store.begin().await?;
        let car = tx
            .find_car(plate_number)
            .await?
            .ok_or_else(|| not_found_error("Car", plate_number))?;

        let mut search = RecordSearch::active();
        search.exact_plate = Some(plate_number.to_string());
        let current_parking = tx.list_records(&search).await?.into_iter().next();

        Ok(CarParkingStatus {
            car,
            is_parked: current_parking.is_some(),
            current_parking,
        })
    }
}
