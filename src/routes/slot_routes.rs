use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use validator::Validate;

use crate::dto::slot_dto::{CreateSlotRequest, SlotListQuery, UpdateSlotRequest, UpdateSlotStatusRequest};
use crate::dto::ApiResponse;
use crate::models::{ParkingSlot, SlotMap, SlotStatistics, SlotType};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_slot_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_slots).post(create_slot))
        .route("/available", get(list_available_slots))
        .route("/type/:slot_type", get(list_slots_by_type))
        .route("/statistics", get(slot_statistics))
        .route("/map", get(slot_map))
        .route(
            "/:slot_number",
            get(get_slot).put(update_slot).delete(delete_slot),
        )
        .route("/:slot_number/status", put(update_slot_status))
}

async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotListQuery>,
) -> Result<Json<ApiResponse<Vec<ParkingSlot>>>, AppError> {
    let slots = state.slots().list(query.into()).await?;
    Ok(Json(ApiResponse::success(slots)))
}

async fn list_available_slots(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ParkingSlot>>>, AppError> {
    let slots = state.slots().list_available().await?;
    Ok(Json(ApiResponse::success(slots)))
}

async fn list_slots_by_type(
    State(state): State<AppState>,
    Path(slot_type): Path<String>,
) -> Result<Json<ApiResponse<Vec<ParkingSlot>>>, AppError> {
    let slot_type: SlotType = slot_type.parse().map_err(AppError::BadRequest)?;
    let slots = state.slots().list_by_type(slot_type).await?;
    Ok(Json(ApiResponse::success(slots)))
}

async fn slot_statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SlotStatistics>>, AppError> {
    let stats = state.slots().statistics().await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn slot_map(State(state): State<AppState>) -> Result<Json<ApiResponse<SlotMap>>, AppError> {
    let map = state.slots().slot_map().await?;
    Ok(Json(ApiResponse::success(map)))
}

async fn get_slot(
    State(state): State<AppState>,
    Path(slot_number): Path<String>,
) -> Result<Json<ApiResponse<ParkingSlot>>, AppError> {
    let slot = state.slots().lookup(&slot_number).await?;
    Ok(Json(ApiResponse::success(slot)))
}

async fn create_slot(
    State(state): State<AppState>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ParkingSlot>>), AppError> {
    request.validate()?;
    let slot = state
        .slots()
        .create_slot(request.slot_number, request.slot_type, request.hourly_rate)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(slot, "Parking slot created successfully")),
    ))
}

async fn update_slot(
    State(state): State<AppState>,
    Path(slot_number): Path<String>,
    Json(request): Json<UpdateSlotRequest>,
) -> Result<Json<ApiResponse<ParkingSlot>>, AppError> {
    request.validate()?;
    let slot = state
        .slots()
        .update_slot(&slot_number, request.slot_type, request.hourly_rate)
        .await?;
    Ok(Json(ApiResponse::success_with_message(slot, "Parking slot updated successfully")))
}

async fn update_slot_status(
    State(state): State<AppState>,
    Path(slot_number): Path<String>,
    Json(request): Json<UpdateSlotStatusRequest>,
) -> Result<Json<ApiResponse<ParkingSlot>>, AppError> {
    let slot = state.slots().set_status(&slot_number, request.status).await?;
    Ok(Json(ApiResponse::success_with_message(slot, "Slot status updated successfully")))
}

async fn delete_slot(
    State(state): State<AppState>,
    Path(slot_number): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.slots().delete_slot(&slot_number).await?;
    Ok(Json(ApiResponse::message("Parking slot deleted successfully")))
}
