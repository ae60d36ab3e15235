use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::{PaymentMethod, PaymentStatus};
use crate::utils::validation::validate_non_negative_amount;

// Request para registrar un pago
#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub record_id: i64,
    #[validate(custom = "validate_non_negative_amount")]
    pub amount_paid: Decimal,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentListQuery {
    pub plate_number: Option<String>,
    pub status: Option<PaymentStatus>,
    pub date_from: Option<chrono::NaiveDate>,
    pub date_to: Option<chrono::NaiveDate>,
}
