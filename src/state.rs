//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los servicios se construyen por request a
//! partir del almacén y el reloj compartidos.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::ParkingStore;
use crate::services::{
    Clock, PaymentReconciler, ReceiptNumberGenerator, ReportingService, SessionManager,
    SlotRegistry, VehicleService,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ParkingStore>,
    pub clock: Arc<dyn Clock>,
    pub config: EnvironmentConfig,
    pub receipts: Arc<ReceiptNumberGenerator>,
}

impl AppState {
    pub fn new(store: Arc<dyn ParkingStore>, clock: Arc<dyn Clock>, config: EnvironmentConfig) -> Self {
        let receipts = Arc::new(ReceiptNumberGenerator::seeded_from(clock.now()));
        Self {
            store,
            clock,
            config,
            receipts,
        }
    }

    pub fn slots(&self) -> SlotRegistry {
        SlotRegistry::new(self.store.clone(), self.clock.clone(), self.config.slot_defaults())
    }

    pub fn vehicles(&self) -> VehicleService {
        VehicleService::new(self.store.clone(), self.clock.clone())
    }

    pub fn sessions(&self) -> SessionManager {
        SessionManager::new(self.store.clone(), self.clock.clone())
    }

    pub fn payments(&self) -> PaymentReconciler {
        PaymentReconciler::new(
            self.store.clone(),
            self.clock.clone(),
            self.receipts.clone(),
            self.config.default_payment_method,
            self.config.invoice_company(),
        )
    }

    pub fn reports(&self) -> ReportingService {
        ReportingService::new(self.store.clone(), self.clock.clone())
    }
}
