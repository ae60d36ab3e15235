//! Services module
//!
//! Lógica de negocio del aparcamiento. Cada servicio recibe el almacén y el
//! reloj por inyección y abre sus propias transacciones.

pub mod clock;
pub mod fee_calculator;
pub mod payment_reconciler;
pub mod receipt_number;
pub mod reporting;
pub mod session_manager;
pub mod slot_registry;
pub mod vehicle_service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fee_calculator::{calculate_parking_fee, format_duration, ParkingFee};
pub use payment_reconciler::PaymentReconciler;
pub use receipt_number::ReceiptNumberGenerator;
pub use reporting::ReportingService;
pub use session_manager::{CarEntry, OwnerDetails, SessionManager};
pub use slot_registry::{SlotDefaults, SlotRegistry};
pub use vehicle_service::{CarHistory, CarParkingStatus, HistoryEntry, VehicleService};
