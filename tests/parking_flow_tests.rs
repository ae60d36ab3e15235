//! Flujo completo sobre el almacén en memoria: entrada, salida, pago e informes.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use uuid::Uuid;

use smartpark_backend::models::{
    InvoiceCompany, NewCar, PaymentMethod, RecordSearch, RecordStatus, SlotStatus, SlotType,
};
use smartpark_backend::repositories::MemoryStore;
use smartpark_backend::services::{
    CarEntry, Clock, ManualClock, OwnerDetails, PaymentReconciler, ReceiptNumberGenerator,
    ReportingService, SessionManager, SlotDefaults, SlotRegistry, VehicleService,
};
use smartpark_backend::utils::errors::AppError;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
}

struct Harness {
    store: MemoryStore,
    clock: Arc<ManualClock>,
    slots: SlotRegistry,
    vehicles: VehicleService,
    sessions: Arc<SessionManager>,
    payments: PaymentReconciler,
    reports: ReportingService,
    operator: Uuid,
}

impl Harness {
    fn new() -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(at(8, 0)));
        let shared_store = Arc::new(store.clone());
        let shared_clock: Arc<dyn Clock> = clock.clone();

        Self {
            slots: SlotRegistry::new(shared_store.clone(), shared_clock.clone(), SlotDefaults::default()),
            vehicles: VehicleService::new(shared_store.clone(), shared_clock.clone()),
            sessions: Arc::new(SessionManager::new(shared_store.clone(), shared_clock.clone())),
            payments: Self::reconciler(&store, shared_clock.clone(), 0),
            reports: ReportingService::new(shared_store, shared_clock),
            store,
            clock,
            operator: Uuid::new_v4(),
        }
    }

    fn reconciler(store: &MemoryStore, clock: Arc<dyn Clock>, seed: u64) -> PaymentReconciler {
        PaymentReconciler::new(
            Arc::new(store.clone()),
            clock,
            Arc::new(ReceiptNumberGenerator::new(seed)),
            PaymentMethod::Cash,
            InvoiceCompany {
                name: "SmartPark".to_string(),
                location: "Kigali, Rwanda".to_string(),
            },
        )
    }

    async fn with_slot(self, slot_number: &str, rate: &str) -> Self {
        self.slots
            .create_slot(slot_number.to_string(), None, Some(dec(rate)))
            .await
            .unwrap();
        self
    }

    fn entry(plate: &str, slot: &str) -> CarEntry {
        CarEntry {
            plate_number: plate.to_string(),
            slot_number: slot.to_string(),
            owner: Some(OwnerDetails {
                driver_name: "Jean Mugabo".to_string(),
                phone_number: "0788123456".to_string(),
                car_model: Some("Toyota RAV4".to_string()),
                car_color: None,
            }),
            entry_time: None,
        }
    }

    async fn slot_status(&self, slot: &str) -> SlotStatus {
        self.slots.lookup(slot).await.unwrap().slot_status
    }

    async fn record_count(&self) -> usize {
        self.sessions
            .search_records(RecordSearch::default())
            .await
            .unwrap()
            .len()
    }
}

#[tokio::test]
async fn test_full_parking_scenario() {
    let h = Harness::new().with_slot("A1", "1000").await;

    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();
    assert_eq!(record.status, RecordStatus::Active);
    assert_eq!(record.entry_time, at(8, 0));
    assert_eq!(record.created_by, h.operator);
    assert!(record.exit_time.is_none());
    assert_eq!(h.slot_status("A1").await, SlotStatus::Occupied);

    h.clock.set(at(9, 30));
    let closed = h.sessions.close_session(record.record_id, None).await.unwrap();
    assert_eq!(closed.status, RecordStatus::Completed);
    assert_eq!(closed.duration_minutes, Some(90));
    assert_eq!(closed.total_amount, Some(dec("2000")));
    assert_eq!(closed.exit_time, Some(at(9, 30)));
    assert_eq!(h.slot_status("A1").await, SlotStatus::Available);

    let payment = h
        .payments
        .record_payment(record.record_id, dec("2000"), None, h.operator)
        .await
        .unwrap();
    assert_eq!(payment.payment_method, PaymentMethod::Cash);
    assert!(payment.receipt_number.starts_with("RCP-20240301-"));
    assert_eq!(payment.receipt_number.len(), "RCP-20240301-000000".len());

    let err = h
        .payments
        .record_payment(record.record_id, dec("1500"), Some(PaymentMethod::Card), h.operator)
        .await
        .unwrap_err();
    match err {
        AppError::InsufficientPayment { due, paid } => {
            assert_eq!(due, dec("2000"));
            assert_eq!(paid, dec("1500"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Un segundo pago completo también se acepta
    let again = h
        .payments
        .record_payment(record.record_id, dec("2000"), None, h.operator)
        .await
        .unwrap();
    assert_ne!(again.receipt_number, payment.receipt_number);
}

#[tokio::test]
async fn test_occupied_slot_is_rejected_without_side_effects() {
    let h = Harness::new().with_slot("A1", "1000").await;
    h.sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();

    let err = h
        .sessions
        .open_session(Harness::entry("RAC456B", "A1"), h.operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SlotUnavailable(_)));

    assert_eq!(h.record_count().await, 1);
    // El vehículo nuevo no queda registrado tras el rechazo
    assert!(matches!(h.vehicles.get("RAC456B").await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_parked_vehicle_cannot_enter_twice() {
    let h = Harness::new()
        .with_slot("A1", "1000")
        .await
        .with_slot("A2", "1000")
        .await;
    h.sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();

    let err = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A2"), h.operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::VehicleAlreadyParked(_)));
    assert_eq!(h.slot_status("A2").await, SlotStatus::Available);
    assert_eq!(h.record_count().await, 1);
}

#[tokio::test]
async fn test_unknown_and_maintenance_slots() {
    let h = Harness::new().with_slot("B1", "1500").await;

    let err = h
        .sessions
        .open_session(Harness::entry("RAB123A", "Z9"), h.operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    h.slots.set_status("B1", SlotStatus::Maintenance).await.unwrap();
    let err = h
        .sessions
        .open_session(Harness::entry("RAB123A", "B1"), h.operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SlotUnavailable(_)));
    assert_eq!(h.record_count().await, 0);
}

#[tokio::test]
async fn test_new_vehicle_requires_owner_details() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let mut entry = Harness::entry("RAB123A", "A1");
    entry.owner = None;

    let err = h.sessions.open_session(entry, h.operator).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(h.slot_status("A1").await, SlotStatus::Available);
}

#[tokio::test]
async fn test_registered_vehicle_enters_without_owner_details() {
    let h = Harness::new().with_slot("A1", "1000").await;
    h.vehicles
        .create(NewCar {
            plate_number: "RAB123A".to_string(),
            driver_name: "Jean Mugabo".to_string(),
            phone_number: "0788123456".to_string(),
            car_model: None,
            car_color: None,
        })
        .await
        .unwrap();

    let mut entry = Harness::entry("RAB123A", "A1");
    entry.owner = None;
    let record = h.sessions.open_session(entry, h.operator).await.unwrap();
    assert!(record.is_active());

    let status = h.vehicles.parking_status("RAB123A").await.unwrap();
    assert!(status.is_parked);
}

#[tokio::test]
async fn test_double_close_is_rejected() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(45));
    let first = h.sessions.close_session(record.record_id, None).await.unwrap();
    assert_eq!(first.total_amount, Some(dec("1000")));

    h.clock.advance(Duration::hours(5));
    let err = h.sessions.close_session(record.record_id, None).await.unwrap_err();
    assert!(matches!(err, AppError::SessionNotActive(_)));

    let stored = h.sessions.get_record(record.record_id).await.unwrap();
    assert_eq!(stored.record.total_amount, Some(dec("1000")));
    assert_eq!(stored.record.duration_minutes, Some(45));

    let err = h.sessions.close_session(9_999, None).await.unwrap_err();
    assert!(matches!(err, AppError::SessionNotActive(_)));
}

#[tokio::test]
async fn test_exit_before_entry_is_rejected() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();

    let err = h
        .sessions
        .close_session(record.record_id, Some(at(7, 59)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let stored = h.sessions.get_record(record.record_id).await.unwrap();
    assert!(stored.record.is_active());
    assert_eq!(h.slot_status("A1").await, SlotStatus::Occupied);
}

#[tokio::test]
async fn test_free_slot_and_one_minute_stay() {
    let h = Harness::new()
        .with_slot("A1", "1000")
        .await
        .with_slot("F1", "0")
        .await;

    let paid = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();
    let free = h
        .sessions
        .open_session(Harness::entry("RAC456B", "F1"), h.operator)
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(1));
    let paid = h.sessions.close_session(paid.record_id, None).await.unwrap();
    let free = h.sessions.close_session(free.record_id, None).await.unwrap();
    assert_eq!(paid.total_amount, Some(dec("1000")));
    assert_eq!(free.total_amount, Some(Decimal::ZERO));

    // Importe cero: cualquier pago no negativo es suficiente
    h.payments
        .record_payment(free.record_id, Decimal::ZERO, None, h.operator)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_commit_leaves_state_unchanged() {
    let h = Harness::new().with_slot("A1", "1000").await;

    h.store.set_fail_commits(true);
    let err = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
    h.store.set_fail_commits(false);

    assert_eq!(h.slot_status("A1").await, SlotStatus::Available);
    assert_eq!(h.record_count().await, 0);
    assert!(h.vehicles.get("RAB123A").await.is_err());

    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(30));
    h.store.set_fail_commits(true);
    assert!(h.sessions.close_session(record.record_id, None).await.is_err());
    h.store.set_fail_commits(false);

    let stored = h.sessions.get_record(record.record_id).await.unwrap();
    assert!(stored.record.is_active());
    assert!(stored.record.total_amount.is_none());
    assert_eq!(h.slot_status("A1").await, SlotStatus::Occupied);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_entries_for_one_slot() {
    let h = Harness::new().with_slot("A1", "1000").await;

    let mut handles = Vec::new();
    for plate in ["RAB001A", "RAB002A", "RAB003A", "RAB004A"] {
        let sessions = h.sessions.clone();
        let operator = h.operator;
        handles.push(tokio::spawn(async move {
            sessions
                .open_session(Harness::entry(plate, "A1"), operator)
                .await
        }));
    }

    let mut opened = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(_) => opened += 1,
            Err(AppError::SlotUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(opened, 1);
    assert_eq!(h.record_count().await, 1);
    assert_eq!(h.sessions.active_records().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_entries_for_one_vehicle() {
    let h = Harness::new()
        .with_slot("A1", "1000")
        .await
        .with_slot("A2", "1000")
        .await
        .with_slot("A3", "1000")
        .await;

    let mut handles = Vec::new();
    for slot in ["A1", "A2", "A3"] {
        let sessions = h.sessions.clone();
        let operator = h.operator;
        handles.push(tokio::spawn(async move {
            sessions
                .open_session(Harness::entry("RAB123A", slot), operator)
                .await
        }));
    }

    let mut opened = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(_) => opened += 1,
            Err(AppError::VehicleAlreadyParked(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(opened, 1);

    let occupied = h
        .slots
        .list(Default::default())
        .await
        .unwrap()
        .into_iter()
        .filter(|s| s.slot_status == SlotStatus::Occupied)
        .count();
    assert_eq!(occupied, 1);
}

#[tokio::test]
async fn test_payment_preconditions() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();

    let err = h
        .payments
        .record_payment(record.record_id, dec("5000"), None, h.operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SessionNotActive(_)));

    let err = h
        .payments
        .record_payment(404, dec("5000"), None, h.operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = h
        .payments
        .record_payment(record.record_id, dec("-1"), None, h.operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_receipt_collision_is_retried() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(20));
    h.sessions.close_session(record.record_id, None).await.unwrap();

    let first = h
        .payments
        .record_payment(record.record_id, dec("1000"), None, h.operator)
        .await
        .unwrap();
    assert_eq!(first.receipt_number, "RCP-20240301-000000");

    // Un segundo generador con la misma semilla colisiona en el primer intento
    let clock: Arc<dyn Clock> = h.clock.clone();
    let other = Harness::reconciler(&h.store, clock, 0);
    let second = other
        .record_payment(record.record_id, dec("1000"), None, h.operator)
        .await
        .unwrap();
    assert_eq!(second.receipt_number, "RCP-20240301-000001");
}

#[tokio::test]
async fn test_receipt_collisions_give_up_after_three_attempts() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(20));
    h.sessions.close_session(record.record_id, None).await.unwrap();

    for _ in 0..3 {
        h.payments
            .record_payment(record.record_id, dec("1000"), None, h.operator)
            .await
            .unwrap();
    }

    let clock: Arc<dyn Clock> = h.clock.clone();
    let other = Harness::reconciler(&h.store, clock, 0);
    let err = other
        .record_payment(record.record_id, dec("1000"), None, h.operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_invoice_for_payment() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();
    h.clock.set(at(9, 30));
    h.sessions.close_session(record.record_id, None).await.unwrap();
    let payment = h
        .payments
        .record_payment(record.record_id, dec("2000"), Some(PaymentMethod::MobileMoney), h.operator)
        .await
        .unwrap();

    let invoice = h.payments.generate_receipt(payment.payment_id).await.unwrap();
    assert_eq!(invoice.company.name, "SmartPark");
    assert_eq!(invoice.payment.receipt_number, payment.receipt_number);
    assert_eq!(invoice.payment.payment_method, PaymentMethod::MobileMoney);
    assert_eq!(invoice.parking.duration, "1h 30m");
    assert_eq!(invoice.parking.plate_number.as_deref(), Some("RAB123A"));
    assert_eq!(invoice.parking.slot_type.as_deref(), Some("regular"));
    assert_eq!(invoice.parking.total_amount, Some(dec("2000")));
    assert_eq!(invoice.processed_by, h.operator.to_string());

    let by_receipt = h.payments.get_by_receipt(&payment.receipt_number).await.unwrap();
    assert_eq!(by_receipt.payment.payment_id, payment.payment_id);

    assert!(matches!(
        h.payments.generate_receipt(777).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_reports_on_empty_store() {
    let h = Harness::new();
    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

    let stats = h.reports.parking_statistics(Some(day), Some(day)).await.unwrap();
    assert_eq!(stats.total_records, 0);
    assert_eq!(stats.total_revenue, Decimal::ZERO);
    assert_eq!(stats.avg_duration_minutes, Decimal::ZERO);

    let daily = h.reports.daily_revenue(day).await.unwrap();
    assert_eq!(daily.date, day);
    assert_eq!(daily.total_parkings, 0);
    assert_eq!(daily.total_revenue, Decimal::ZERO);

    let payments = h.reports.payment_statistics(None, None).await.unwrap();
    assert_eq!(payments.total_payments, 0);
    assert_eq!(payments.average_amount, Decimal::ZERO);

    assert!(h.reports.daily_payment_revenue(day).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reports_after_activity() {
    let h = Harness::new()
        .with_slot("A1", "1000")
        .await
        .with_slot("A2", "1000")
        .await
        .with_slot("V1", "2500")
        .await;

    let first = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();
    let second = h
        .sessions
        .open_session(Harness::entry("RAC456B", "V1"), h.operator)
        .await
        .unwrap();
    h.sessions
        .open_session(Harness::entry("RAD789C", "A2"), h.operator)
        .await
        .unwrap();

    h.clock.set(at(9, 30));
    h.sessions.close_session(first.record_id, None).await.unwrap();
    h.clock.set(at(8, 30));
    h.sessions.close_session(second.record_id, None).await.unwrap();

    h.payments
        .record_payment(first.record_id, dec("2000"), None, h.operator)
        .await
        .unwrap();
    h.payments
        .record_payment(second.record_id, dec("3000"), Some(PaymentMethod::Card), h.operator)
        .await
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let stats = h.reports.parking_statistics(Some(day), Some(day)).await.unwrap();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.active_records, 1);
    assert_eq!(stats.completed_records, 2);
    assert_eq!(stats.total_revenue, dec("4500"));
    assert_eq!(stats.avg_duration_minutes, dec("60"));

    let daily = h.reports.daily_revenue(day).await.unwrap();
    assert_eq!(daily.total_parkings, 3);
    assert_eq!(daily.total_revenue, dec("4500"));

    let other_day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
    assert_eq!(h.reports.daily_revenue(other_day).await.unwrap().total_parkings, 0);

    let payments = h.reports.payment_statistics(Some(day), Some(day)).await.unwrap();
    assert_eq!(payments.total_payments, 2);
    assert_eq!(payments.total_amount, dec("5000"));
    assert_eq!(payments.average_amount, dec("2500"));
    assert_eq!(payments.cash_payments, dec("2000"));
    assert_eq!(payments.card_payments, dec("3000"));

    let by_method = h.reports.daily_payment_revenue(day).await.unwrap();
    assert_eq!(by_method.len(), 2);

    let dashboard = h.reports.dashboard().await.unwrap();
    assert_eq!(dashboard.active_parkings, 1);
    assert_eq!(dashboard.slot_statistics.total_slots, 3);
    assert_eq!(dashboard.slot_statistics.occupied_slots, 1);
    assert_eq!(dashboard.recent_records.len(), 3);
    assert_eq!(dashboard.today_revenue.total_revenue, dec("4500"));
}

#[tokio::test]
async fn test_slot_with_active_session_cannot_be_deleted() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();

    // Override administrativo sobre un slot ocupado
    h.slots.set_status("A1", SlotStatus::Available).await.unwrap();
    let err = h
        .sessions
        .open_session(Harness::entry("RAC456B", "A1"), h.operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SlotUnavailable(_)));

    assert!(matches!(h.slots.delete_slot("A1").await, Err(AppError::Conflict(_))));

    h.clock.advance(Duration::minutes(10));
    h.sessions.close_session(record.record_id, None).await.unwrap();
    h.slots.delete_slot("A1").await.unwrap();
    assert!(matches!(h.slots.lookup("A1").await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_vehicle_history_includes_payments() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(61));
    h.sessions.close_session(record.record_id, None).await.unwrap();
    h.payments
        .record_payment(record.record_id, dec("2000"), None, h.operator)
        .await
        .unwrap();

    let history = h.vehicles.history("RAB123A").await.unwrap();
    assert_eq!(history.car.driver_name, "Jean Mugabo");
    assert_eq!(history.history.len(), 1);
    assert_eq!(history.history[0].payments.len(), 1);

    let slot = h.slots.lookup("A1").await.unwrap();
    assert_eq!(slot.slot_type, SlotType::Regular);
}

#[tokio::test]
async fn test_parked_vehicle_cannot_be_deleted() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let record = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();

    let err = h.vehicles.delete("RAB123A").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let stored = h.sessions.get_record(record.record_id).await.unwrap();
    assert_eq!(stored.record.status, RecordStatus::Active);
    assert_eq!(h.slot_status("A1").await, SlotStatus::Occupied);
    assert_eq!(h.vehicles.get("RAB123A").await.unwrap().plate_number, "RAB123A");

    h.clock.advance(Duration::minutes(20));
    h.sessions.close_session(record.record_id, None).await.unwrap();
    h.vehicles.delete("RAB123A").await.unwrap();
    assert!(matches!(h.vehicles.get("RAB123A").await, Err(AppError::NotFound(_))));
    assert!(matches!(h.vehicles.delete("RAB123A").await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_dashboard_lists_only_latest_sessions() {
    let h = Harness::new().with_slot("A1", "1000").await;
    let mut last_id = 0;
    for _ in 0..12 {
        let record = h
            .sessions
            .open_session(Harness::entry("RAB123A", "A1"), h.operator)
            .await
            .unwrap();
        h.clock.advance(Duration::minutes(10));
        h.sessions.close_session(record.record_id, None).await.unwrap();
        last_id = record.record_id;
    }

    let dashboard = h.reports.dashboard().await.unwrap();
    assert_eq!(dashboard.recent_records.len(), 10);
    assert_eq!(dashboard.recent_records[0].record.record_id, last_id);
    assert_eq!(dashboard.today_revenue.total_parkings, 12);
    assert_eq!(dashboard.today_revenue.total_revenue, dec("12000"));
    assert_eq!(dashboard.today_revenue.avg_duration, dec("10"));

    let limited = h
        .sessions
        .search_records(RecordSearch {
            limit: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 3);
    assert_eq!(h.record_count().await, 12);
}

#[tokio::test]
async fn test_deleting_free_slot_drops_its_history() {
    let h = Harness::new()
        .with_slot("A1", "1000")
        .await
        .with_slot("A2", "1000")
        .await;
    let first = h
        .sessions
        .open_session(Harness::entry("RAB123A", "A1"), h.operator)
        .await
        .unwrap();
    let second = h
        .sessions
        .open_session(Harness::entry("RAC456B", "A2"), h.operator)
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(30));
    h.sessions.close_session(first.record_id, None).await.unwrap();
    h.sessions.close_session(second.record_id, None).await.unwrap();
    let payment = h
        .payments
        .record_payment(first.record_id, dec("1000"), None, h.operator)
        .await
        .unwrap();

    h.slots.delete_slot("A1").await.unwrap();

    assert!(matches!(h.sessions.get_record(first.record_id).await, Err(AppError::NotFound(_))));
    assert!(matches!(h.payments.get(payment.payment_id).await, Err(AppError::NotFound(_))));
    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let stats = h.reports.parking_statistics(Some(day), Some(day)).await.unwrap();
    assert_eq!(stats.total_records, 1);
    assert_eq!(stats.total_revenue, dec("1000"));
}

#[tokio::test]
async fn test_rates_beyond_cents_are_rejected() {
    let h = Harness::new().with_slot("A1", "1000").await;

    let err = h
        .slots
        .create_slot("A2".to_string(), None, Some(dec("10.005")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(matches!(h.slots.lookup("A2").await, Err(AppError::NotFound(_))));

    let err = h
        .slots
        .update_slot("A1", None, Some(dec("1500.125")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(h.slots.lookup("A1").await.unwrap().hourly_rate, dec("1000"));

    let slot = h.slots.update_slot("A1", None, Some(dec("1500.50"))).await.unwrap();
    assert_eq!(slot.hourly_rate, dec("1500.50"));
}
