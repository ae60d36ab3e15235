use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::{SlotFilter, SlotStatus, SlotType};
use crate::utils::validation::validate_non_negative_amount;

// Request para crear un slot
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSlotRequest {
    #[validate(length(min = 1, max = 10))]
    pub slot_number: String,
    pub slot_type: Option<SlotType>,
    #[validate(custom = "validate_non_negative_amount")]
    pub hourly_rate: Option<Decimal>,
}

// Request para actualizar categoría y tarifa
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSlotRequest {
    pub slot_type: Option<SlotType>,
    #[validate(custom = "validate_non_negative_amount")]
    pub hourly_rate: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSlotStatusRequest {
    pub status: SlotStatus,
}

// Query ?status=&slot_type=
#[derive(Debug, Default, Deserialize)]
pub struct SlotListQuery {
    pub status: Option<SlotStatus>,
    pub slot_type: Option<SlotType>,
}

impl From<SlotListQuery> for SlotFilter {
    fn from(query: SlotListQuery) -> Self {
        SlotFilter {
            status: query.status,
            slot_type: query.slot_type,
        }
    }
}
