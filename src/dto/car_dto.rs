use serde::Deserialize;
use validator::Validate;

use crate::models::{CarSearch, CarUpdate, NewCar};
use crate::utils::validation::{validate_phone, validate_plate_number};

// Request para registrar un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCarRequest {
    #[validate(length(max = 20), custom = "validate_plate_number")]
    pub plate_number: String,
    #[validate(length(min = 1, max = 100))]
    pub driver_name: String,
    #[validate(custom = "validate_phone")]
    pub phone_number: String,
    #[validate(length(max = 50))]
    pub car_model: Option<String>,
    #[validate(length(max = 30))]
    pub car_color: Option<String>,
}

impl From<CreateCarRequest> for NewCar {
    fn from(request: CreateCarRequest) -> Self {
        NewCar {
            plate_number: request.plate_number,
            driver_name: request.driver_name,
            phone_number: request.phone_number,
            car_model: request.car_model,
            car_color: request.car_color,
        }
    }
}

// Request para actualizar un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCarRequest {
    #[validate(length(min = 1, max = 100))]
    pub driver_name: String,
    #[validate(custom = "validate_phone")]
    pub phone_number: String,
    #[validate(length(max = 50))]
    pub car_model: Option<String>,
    #[validate(length(max = 30))]
    pub car_color: Option<String>,
}

impl From<UpdateCarRequest> for CarUpdate {
    fn from(request: UpdateCarRequest) -> Self {
        CarUpdate {
            driver_name: request.driver_name,
            phone_number: request.phone_number,
            car_model: request.car_model,
            car_color: request.car_color,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CarSearchQuery {
    pub plate_number: Option<String>,
    pub driver_name: Option<String>,
    pub phone_number: Option<String>,
}

impl From<CarSearchQuery> for CarSearch {
    fn from(query: CarSearchQuery) -> Self {
        CarSearch {
            plate_number: query.plate_number,
            driver_name: query.driver_name,
            phone_number: query.phone_number,
        }
    }
}
