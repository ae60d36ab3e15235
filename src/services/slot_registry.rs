//! Registro de slots
//!
//! Dueño del estado de cada plaza. `set_status` sobrescribe sin comprobar
//! sesiones: es la vía administrativa (mantenimiento). La exclusividad de
//! ocupación la garantiza `SessionManager`.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::models::{
    NewSlot, ParkingSlot, SlotFilter, SlotMap, SlotStatistics, SlotStatus, SlotType,
};
use crate::repositories::ParkingStore;
use crate::services::clock::Clock;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Valores por defecto al crear slots
#[derive(Debug, Clone)]
pub struct SlotDefaults {
    pub slot_type: SlotType,
    pub hourly_rate: Decimal,
}

impl Default for SlotDefaults {
    fn default() -> Self {
        Self {
            slot_type: SlotType::Regular,
            hourly_rate: Decimal::new(100000, 2),
        }
    }
}

pub struct SlotRegistry {
    store: Arc<dyn ParkingStore>,
    clock: Arc<dyn Clock>,
    defaults: SlotDefaults,
}

impl SlotRegistry {
    pub fn new(store: Arc<dyn ParkingStore>, clock: Arc<dyn Clock>, defaults: SlotDefaults) -> Self {
        Self {
            store,
            clock,
            defaults,
        }
    }

    pub async fn create_slot(
        &self,
        slot_number: String,
        slot_type: Option<SlotType>,
        hourly_rate: Option<Decimal>,
    ) -> AppResult<ParkingSlot> {
        let hourly_rate = hourly_rate.unwrap_or(self.defaults.hourly_rate);
        ensure_valid_rate(hourly_rate)?;

        let mut tx = self.store.begin().await?;
        let slot = tx
            .insert_slot(
                NewSlot {
                    slot_number,
                    slot_type: slot_type.unwrap_or(self.defaults.slot_type),
                    hourly_rate,
                },
                self.clock.now(),
            )
            .await?;
        tx.commit().await?;

        info!("Slot {} creado ({}, {}/h)", slot.slot_number, slot.slot_type, slot.hourly_rate);
        Ok(slot)
    }

    pub async fn lookup(&self, slot_number: &str) -> AppResult<ParkingSlot> {
        let mut tx = self.store.begin().await?;
        tx.find_slot(slot_number)
            .await?
            .ok_or_else(|| not_found_error("Parking slot", slot_number))
    }

    pub async fn list(&self, filter: SlotFilter) -> AppResult<Vec<ParkingSlot>> {
        let mut tx = self.store.begin().await?;
        let slots = tx.list_slots(&filter).await?;
        Ok(slots)
    }

    pub async fn list_available(&self) -> AppResult<Vec<ParkingSlot>> {
        self.list(SlotFilter {
            status: Some(SlotStatus::Available),
            ..Default::default()
        })
        .await
    }

    pub async fn list_by_type(&self, slot_type: SlotType) -> AppResult<Vec<ParkingSlot>> {
        self.list(SlotFilter {
            slot_type: Some(slot_type),
            ..Default::default()
        })
        .await
    }

    /// Actualiza categoría y/o tarifa. Los campos ausentes conservan su valor.
    pub async fn update_slot(
        &self,
        slot_number: &str,
        slot_type: Option<SlotType>,
        hourly_rate: Option<Decimal>,
    ) -> AppResult<ParkingSlot> {
        if let Some(rate) = hourly_rate {
            ensure_valid_rate(rate)?;
        }

        let mut tx = self.store.begin().await?;
        let current = tx
            .lock_slot(slot_number)
            .await?
            .ok_or_else(|| not_found_error("Parking slot", slot_number))?;

        let updated = tx
            .update_slot(
                slot_number,
                slot_type.unwrap_or(current.slot_type),
                hourly_rate.unwrap_or(current.hourly_rate),
                self.clock.now(),
            )
            .await?
            .ok_or_else(|| not_found_error("Parking slot", slot_number))?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Sobrescritura administrativa del estado
    pub async fn set_status(&self, slot_number: &str, status: SlotStatus) -> AppResult<ParkingSlot> {
        let mut tx = self.store.begin().await?;
        let slot = tx
            .set_slot_status(slot_number, status, self.clock.now())
            .await?
            .ok_or_else(|| not_found_error("Parking slot", slot_number))?;
        tx.commit().await?;

        info!("Estado del slot {} forzado a {}", slot_number, status);
        Ok(slot)
    }

    /// Elimina un slot. Se rechaza mientras tenga una sesión activa.
    pub async fn delete_slot(&self, slot_number: &str) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let slot = tx
            .lock_slot(slot_number)
            .await?
            .ok_or_else(|| not_found_error("Parking slot", slot_number))?;

        if slot.slot_status == SlotStatus::Occupied || tx.has_active_record_for_slot(slot_number).await? {
            return Err(AppError::Conflict(format!(
                "Cannot delete slot '{}' with active parking records",
                slot_number
            )));
        }

        tx.delete_slot(slot_number).await?;
        tx.commit().await?;

        info!("Slot {} eliminado", slot_number);
        Ok(())
    }

    pub async fn statistics(&self) -> AppResult<SlotStatistics> {
        let slots = self.list(SlotFilter::default()).await?;
        Ok(slot_statistics(&slots))
    }

    pub async fn slot_map(&self) -> AppResult<SlotMap> {
        let slots = self.list(SlotFilter::default()).await?;
        Ok(build_slot_map(slots))
    }
}

/// Tarifas en unidades monetarias con hasta dos decimales
const RATE_DECIMAL_PLACES: u32 = 2;

fn ensure_valid_rate(rate: Decimal) -> AppResult<()> {
    if rate < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Hourly rate must be a non-negative number".to_string(),
        ));
    }
    if rate.normalize().scale() > RATE_DECIMAL_PLACES {
        return Err(AppError::BadRequest(format!(
            "Hourly rate must have at most {} decimal places",
            RATE_DECIMAL_PLACES
        )));
    }
    Ok(())
}

pub fn slot_statistics(slots: &[ParkingSlot]) -> SlotStatistics {
    let mut stats = SlotStatistics {
        total_slots: slots.len() as i64,
        ..Default::default()
    };
    for slot in slots {
        match slot.slot_status {
            SlotStatus::Available => stats.available_slots += 1,
            SlotStatus::Occupied => stats.occupied_slots += 1,
            SlotStatus::Maintenance => stats.maintenance_slots += 1,
        }
        match slot.slot_type {
            SlotType::Regular => stats.regular_slots += 1,
            SlotType::Vip => stats.vip_slots += 1,
            SlotType::Disabled => stats.disabled_slots += 1,
        }
    }
    stats
}

/// Agrupa por sección (primer carácter) y ordena por la parte numérica
pub fn build_slot_map(slots: Vec<ParkingSlot>) -> SlotMap {
    let total_slots = slots.len();
    let by_status = |status: SlotStatus| slots.iter().filter(|s| s.slot_status == status).count();
    let available_count = by_status(SlotStatus::Available);
    let occupied_count = by_status(SlotStatus::Occupied);
    let maintenance_count = by_status(SlotStatus::Maintenance);

    let mut sections: BTreeMap<String, Vec<ParkingSlot>> = BTreeMap::new();
    for slot in slots {
        let section = slot
            .slot_number
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default();
        sections.entry(section).or_default().push(slot);
    }
    for section in sections.values_mut() {
        section.sort_by(|a, b| {
            section_position(&a.slot_number)
                .cmp(&section_position(&b.slot_number))
                .then_with(|| a.slot_number.cmp(&b.slot_number))
        });
    }

    SlotMap {
        sections,
        total_slots,
        available_count,
        occupied_count,
        maintenance_count,
    }
}

/// Parte numérica tras la letra de sección; los no numéricos van al final
fn section_position(slot_number: &str) -> u64 {
    let mut chars = slot_number.chars();
    chars.next();
    chars.as_str().parse().unwrap_or(u64::MAX)
}
