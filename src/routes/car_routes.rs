use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use validator::Validate;

use crate::dto::car_dto::{CarSearchQuery, CreateCarRequest, UpdateCarRequest};
use crate::dto::ApiResponse;
use crate::models::Car;
use crate::services::{CarHistory, CarParkingStatus};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_car_router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_cars).post(create_car))
        .route("/search", get(search_cars))
        .route(
            "/:plate_number",
            get(get_car).put(update_car).delete(delete_car),
        )
        .route("/:plate_number/history", get(car_history))
        .route("/:plate_number/status", get(car_parking_status))
}

async fn search_cars(
    State(state): State<AppState>,
    Query(query): Query<CarSearchQuery>,
) -> Result<Json<ApiResponse<Vec<Car>>>, AppError> {
    let cars = state.vehicles().search(query.into()).await?;
    Ok(Json(ApiResponse::success(cars)))
}

async fn get_car(
    State(state): State<AppState>,
    Path(plate_number): Path<String>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let car = state.vehicles().get(&plate_number).await?;
    Ok(Json(ApiResponse::success(car)))
}

async fn create_car(
    State(state): State<AppState>,
    Json(request): Json<CreateCarRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Car>>), AppError> {
    request.validate()?;
    let car = state.vehicles().create(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(car, "Car registered successfully")),
    ))
}

async fn update_car(
    State(state): State<AppState>,
    Path(plate_number): Path<String>,
    Json(request): Json<UpdateCarRequest>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    request.validate()?;
    let car = state.vehicles().update(&plate_number, request.into()).await?;
    Ok(Json(ApiResponse::success_with_message(car, "Car updated successfully")))
}

async fn delete_car(
    State(state): State<AppState>,
    Path(plate_number): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.vehicles().delete(&plate_number).await?;
    Ok(Json(ApiResponse::message("Car deleted successfully")))
}

async fn car_history(
    State(state): State<AppState>,
    Path(plate_number): Path<String>,
) -> Result<Json<ApiResponse<CarHistory>>, AppError> {
    let history = state.vehicles().history(&plate_number).await?;
    Ok(Json(ApiResponse::success(history)))
}

async fn car_parking_status(
    State(state): State<AppState>,
    Path(plate_number): Path<String>,
) -> Result<Json<ApiResponse<CarParkingStatus>>, AppError> {
    let status = state.vehicles().parking_status(&plate_number).await?;
    Ok(Json(ApiResponse::success(status)))
}
