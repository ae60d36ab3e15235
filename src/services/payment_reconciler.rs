//! Conciliación de pagos
//!
//! Registra pagos sobre sesiones cerradas. Cada pago debe cubrir por sí solo
//! el importe de la sesión (sin pagos parciales). Se admiten varios pagos por
//! sesión. Registrar un pago no toca ni la sesión ni el slot.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    Invoice, InvoiceCompany, InvoiceParking, InvoicePayment, NewPayment, Payment, PaymentDetails,
    PaymentFilter, PaymentMethod, PaymentStatus,
};
use crate::repositories::ParkingStore;
use crate::services::clock::Clock;
use crate::services::fee_calculator::format_duration;
use crate::services::receipt_number::ReceiptNumberGenerator;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Reintentos ante colisión del número de recibo
const MAX_RECEIPT_ATTEMPTS: usize = 3;

pub struct PaymentReconciler {
    store: Arc<dyn ParkingStore>,
    clock: Arc<dyn Clock>,
    receipts: Arc<ReceiptNumberGenerator>,
    default_method: PaymentMethod,
    company: InvoiceCompany,
}

impl PaymentReconciler {
    pub fn new(
        store: Arc<dyn ParkingStore>,
        clock: Arc<dyn Clock>,
        receipts: Arc<ReceiptNumberGenerator>,
        default_method: PaymentMethod,
        company: InvoiceCompany,
    ) -> Self {
        Self {
            store,
            clock,
            receipts,
            default_method,
            company,
        }
    }

    /// Registra un pago contra una sesión completada
    pub async fn record_payment(
        &self,
        record_id: i64,
        amount_paid: Decimal,
        method: Option<PaymentMethod>,
        operator_id: Uuid,
    ) -> AppResult<Payment> {
        if amount_paid < Decimal::ZERO {
            return Err(AppError::BadRequest(
                "Payment amount must be a non-negative number".to_string(),
            ));
        }
        let method = method.unwrap_or(self.default_method);

        let mut attempt = 1;
        loop {
            match self
                .try_record_payment(record_id, amount_paid, method, operator_id)
                .await
            {
                Err(AppError::Conflict(msg)) if attempt < MAX_RECEIPT_ATTEMPTS => {
                    warn!("Colisión de número de recibo (intento {}): {}", attempt, msg);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_record_payment(
        &self,
        record_id: i64,
        amount_paid: Decimal,
        method: PaymentMethod,
        operator_id: Uuid,
    ) -> AppResult<Payment> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let record = tx
            .lock_record(record_id)
            .await?
            .ok_or_else(|| not_found_error("Parking record", &record_id.to_string()))?;

        if record.is_active() {
            return Err(AppError::SessionNotActive(format!(
                "Parking record {} is still active; record the exit before the payment",
                record_id
            )));
        }

        let amount_due = record.total_amount.unwrap_or(Decimal::ZERO);
        if amount_paid < amount_due {
            return Err(AppError::InsufficientPayment {
                due: amount_due,
                paid: amount_paid,
            });
        }

        let payment = tx
            .insert_payment(NewPayment {
                record_id,
                amount_paid,
                payment_method: method,
                receipt_number: self.receipts.next(now),
                payment_date: now,
                created_by: operator_id,
            })
            .await?;
        tx.commit().await?;

        info!(
            "Pago {} registrado para la sesión {}: {} ({}), recibo {}",
            payment.payment_id, record_id, amount_paid, method, payment.receipt_number
        );
        Ok(payment)
    }

    pub async fn get(&self, payment_id: i64) -> AppResult<PaymentDetails> {
        let mut tx = self.store.begin().await?;
        tx.find_payment(payment_id)
            .await?
            .ok_or_else(|| not_found_error("Payment", &payment_id.to_string()))
    }

    pub async fn get_by_receipt(&self, receipt_number: &str) -> AppResult<PaymentDetails> {
        let mut tx = self.store.begin().await?;
        tx.find_payment_by_receipt(receipt_number)
            .await?
            .ok_or_else(|| not_found_error("Payment", receipt_number))
    }

    pub async fn list(&self, filter: PaymentFilter) -> AppResult<Vec<PaymentDetails>> {
        let mut tx = self.store.begin().await?;
        let payments = tx.list_payments(&filter).await?;
        Ok(payments)
    }

    pub async fn update_status(&self, payment_id: i64, status: PaymentStatus) -> AppResult<Payment> {
        let mut tx = self.store.begin().await?;
        let payment = tx
            .update_payment_status(payment_id, status)
            .await?
            .ok_or_else(|| not_found_error("Payment", &payment_id.to_string()))?;
        tx.commit().await?;
        Ok(payment)
    }

    pub async fn delete(&self, payment_id: i64) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_payment(payment_id).await? {
            return Err(not_found_error("Payment", &payment_id.to_string()));
        }
        tx.commit().await?;

        info!("Pago {} eliminado", payment_id);
        Ok(())
    }

    /// Factura legible de un pago (solo lectura)
    pub async fn generate_receipt(&self, payment_id: i64) -> AppResult<Invoice> {
        let details = self.get(payment_id).await?;

        let duration = match (details.entry_time, details.exit_time) {
            (Some(entry), Some(exit)) => format_duration(entry, exit),
            _ => "0h 0m".to_string(),
        };

        Ok(Invoice {
            company: self.company.clone(),
            payment: InvoicePayment {
                receipt_number: details.payment.receipt_number,
                payment_date: details.payment.payment_date,
                amount_paid: details.payment.amount_paid,
                payment_method: details.payment.payment_method,
            },
            parking: InvoiceParking {
                plate_number: details.plate_number,
                driver_name: details.driver_name,
                phone_number: details.phone_number,
                slot_number: details.slot_number,
                slot_type: details.slot_type.map(|t| t.to_string()),
                entry_time: details.entry_time,
                exit_time: details.exit_time,
                duration,
                total_amount: details.total_amount,
            },
            processed_by: details.payment.created_by.to_string(),
            generated_at: self.clock.now(),
        })
    }
}
