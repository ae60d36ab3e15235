use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::models::{RecordSearch, RecordStatus};
use crate::services::{CarEntry, OwnerDetails};
use crate::utils::validation::{validate_phone, validate_plate_number};

// Request de entrada de un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CarEntryRequest {
    #[validate(length(max = 20), custom = "validate_plate_number")]
    pub plate_number: String,
    #[validate(length(min = 1, max = 10))]
    pub slot_number: String,
    #[validate(length(min = 1, max = 100))]
    pub driver_name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,
    pub car_model: Option<String>,
    pub car_color: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
}

impl From<CarEntryRequest> for CarEntry {
    fn from(request: CarEntryRequest) -> Self {
        let owner = match (request.driver_name, request.phone_number) {
            (Some(driver_name), Some(phone_number)) => Some(OwnerDetails {
                driver_name,
                phone_number,
                car_model: request.car_model,
                car_color: request.car_color,
            }),
            _ => None,
        };
        CarEntry {
            plate_number: request.plate_number,
            slot_number: request.slot_number,
            owner,
            entry_time: request.entry_time,
        }
    }
}

// Request de salida
#[derive(Debug, Default, Deserialize)]
pub struct CarExitRequest {
    pub exit_time: Option<DateTime<Utc>>,
}

// Query de búsqueda de sesiones
#[derive(Debug, Default, Deserialize)]
pub struct RecordSearchQuery {
    pub plate_number: Option<String>,
    pub slot_number: Option<String>,
    pub status: Option<RecordStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl From<RecordSearchQuery> for RecordSearch {
    fn from(query: RecordSearchQuery) -> Self {
        RecordSearch {
            plate_number: query.plate_number,
            exact_plate: None,
            slot_number: query.slot_number,
            status: query.status,
            date_from: query.date_from,
            date_to: query.date_to,
            limit: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}
