//! Objetos de transferencia de la API HTTP

pub mod api_response;
pub mod car_dto;
pub mod parking_dto;
pub mod payment_dto;
pub mod slot_dto;

pub use api_response::ApiResponse;
