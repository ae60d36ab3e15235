use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::dto::parking_dto::DateRangeQuery;
use crate::dto::payment_dto::{PaymentListQuery, RecordPaymentRequest, UpdatePaymentStatusRequest};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedOperator;
use crate::models::{
    DailyPaymentRevenue, Invoice, Payment, PaymentDetails, PaymentFilter, PaymentStatistics,
};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::parse_date;

pub fn create_payment_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payments).post(record_payment))
        .route("/statistics", get(payment_statistics))
        .route("/range", get(payments_by_range))
        .route("/revenue/:date", get(daily_payment_revenue))
        .route("/receipt/:receipt_number", get(get_payment_by_receipt))
        .route("/record/:record_id", get(payments_by_record))
        .route("/:payment_id", get(get_payment).delete(delete_payment))
        .route("/:payment_id/status", put(update_payment_status))
        .route("/:payment_id/invoice", get(payment_invoice))
}

async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<ApiResponse<Vec<PaymentDetails>>>, AppError> {
    let filter = PaymentFilter {
        record_id: None,
        plate_number: query.plate_number,
        status: query.status,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let payments = state.payments().list(filter).await?;
    Ok(Json(ApiResponse::success(payments)))
}

async fn record_payment(
    State(state): State<AppState>,
    Extension(operator): Extension<AuthenticatedOperator>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Payment>>), AppError> {
    request.validate()?;
    let payment = state
        .payments()
        .record_payment(
            request.record_id,
            request.amount_paid,
            request.payment_method,
            operator.operator_id,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(payment, "Payment recorded successfully")),
    ))
}

async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
) -> Result<Json<ApiResponse<PaymentDetails>>, AppError> {
    let payment = state.payments().get(payment_id).await?;
    Ok(Json(ApiResponse::success(payment)))
}

async fn get_payment_by_receipt(
    State(state): State<AppState>,
    Path(receipt_number): Path<String>,
) -> Result<Json<ApiResponse<PaymentDetails>>, AppError> {
    let payment = state.payments().get_by_receipt(&receipt_number).await?;
    Ok(Json(ApiResponse::success(payment)))
}

async fn payments_by_record(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<PaymentDetails>>>, AppError> {
    let payments = state
        .payments()
        .list(PaymentFilter {
            record_id: Some(record_id),
            ..Default::default()
        })
        .await?;
    Ok(Json(ApiResponse::success(payments)))
}

async fn payments_by_range(
    State(state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<PaymentDetails>>>, AppError> {
    let (Some(date_from), Some(date_to)) = (range.date_from, range.date_to) else {
        return Err(AppError::BadRequest(
            "date_from and date_to are required".to_string(),
        ));
    };
    let payments = state
        .payments()
        .list(PaymentFilter {
            date_from: Some(date_from),
            date_to: Some(date_to),
            ..Default::default()
        })
        .await?;
    Ok(Json(ApiResponse::success(payments)))
}

async fn update_payment_status(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
    Json(request): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<ApiResponse<Payment>>, AppError> {
    let payment = state
        .payments()
        .update_status(payment_id, request.payment_status)
        .await?;
    Ok(Json(ApiResponse::success_with_message(payment, "Payment status updated successfully")))
}

async fn delete_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.payments().delete(payment_id).await?;
    Ok(Json(ApiResponse::message("Payment deleted successfully")))
}

async fn payment_statistics(
    State(state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<PaymentStatistics>>, AppError> {
    let stats = state
        .reports()
        .payment_statistics(range.date_from, range.date_to)
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn daily_payment_revenue(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<ApiResponse<Vec<DailyPaymentRevenue>>>, AppError> {
    let rows = state
        .reports()
        .daily_payment_revenue(parse_date(&date)?)
        .await?;
    Ok(Json(ApiResponse::success(rows)))
}

async fn payment_invoice(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let invoice = state.payments().generate_receipt(payment_id).await?;
    Ok(Json(ApiResponse::success(invoice)))
}
