//! Rutas HTTP
//!
//! Todas las rutas bajo `/api` requieren un token de operador.

pub mod car_routes;
pub mod health_routes;
pub mod parking_routes;
pub mod payment_routes;
pub mod slot_routes;

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::{auth_middleware, cors_layer};
use crate::state::AppState;

pub fn create_app_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/slots", slot_routes::create_slot_router())
        .nest("/api/cars", car_routes::create_car_router())
        .nest("/api/parking", parking_routes::create_parking_router())
        .nest("/api/payments", payment_routes::create_payment_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health_routes::create_health_router())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
