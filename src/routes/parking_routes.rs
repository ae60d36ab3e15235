use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::dto::parking_dto::{CarEntryRequest, CarExitRequest, DateRangeQuery, RecordSearchQuery};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedOperator;
use crate::models::{
    Dashboard, DailyParkingRevenue, ParkingRecord, ParkingRecordDetails, ParkingStatistics,
};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::parse_date;

pub fn create_parking_router() -> Router<AppState> {
    Router::new()
        .route("/records", get(search_records))
        .route("/records/search", get(search_records))
        .route("/records/active", get(active_records))
        .route("/records/:record_id", get(get_record))
        .route("/entry", post(car_entry))
        .route("/exit/:record_id", put(car_exit))
        .route("/statistics", get(parking_statistics))
        .route("/revenue/:date", get(daily_revenue))
        .route("/dashboard", get(dashboard))
}

async fn search_records(
    State(state): State<AppState>,
    Query(query): Query<RecordSearchQuery>,
) -> Result<Json<ApiResponse<Vec<ParkingRecordDetails>>>, AppError> {
    let records = state.sessions().search_records(query.into()).await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn active_records(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ParkingRecordDetails>>>, AppError> {
    let records = state.sessions().active_records().await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn get_record(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> Result<Json<ApiResponse<ParkingRecordDetails>>, AppError> {
    let record = state.sessions().get_record(record_id).await?;
    Ok(Json(ApiResponse::success(record)))
}

async fn car_entry(
    State(state): State<AppState>,
    Extension(operator): Extension<AuthenticatedOperator>,
    Json(request): Json<CarEntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ParkingRecord>>), AppError> {
    request.validate()?;
    let record = state
        .sessions()
        .open_session(request.into(), operator.operator_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(record, "Car entry recorded successfully")),
    ))
}

async fn car_exit(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    body: Bytes,
) -> Result<Json<ApiResponse<ParkingRecord>>, AppError> {
    let exit_time = parse_exit_request(&body)?.exit_time;
    let record = state.sessions().close_session(record_id, exit_time).await?;
    Ok(Json(ApiResponse::success_with_message(record, "Car exit recorded successfully")))
}

/// Cuerpo opcional: vacío equivale a salir ahora; un cuerpo inválido se rechaza
fn parse_exit_request(body: &[u8]) -> Result<CarExitRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CarExitRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid exit request body: {}", e)))
}

async fn parking_statistics(
    State(state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<ParkingStatistics>>, AppError> {
    let stats = state
        .reports()
        .parking_statistics(range.date_from, range.date_to)
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn daily_revenue(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<ApiResponse<DailyParkingRevenue>>, AppError> {
    let revenue = state.reports().daily_revenue(parse_date(&date)?).await?;
    Ok(Json(ApiResponse::success(revenue)))
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<ApiResponse<Dashboard>>, AppError> {
    let dashboard = state.reports().dashboard().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_exit_body_means_now() {
        assert!(parse_exit_request(b"").unwrap().exit_time.is_none());
        assert!(parse_exit_request(b" \n").unwrap().exit_time.is_none());
        assert!(parse_exit_request(b"{}").unwrap().exit_time.is_none());
    }

    #[test]
    fn test_invalid_exit_body_is_bad_request() {
        let err = parse_exit_request(br#"{"exit_time":"not-a-timestamp"}"#).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(matches!(parse_exit_request(b"{"), Err(AppError::BadRequest(_))));
    }
}
