// libs/doctor-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    // Browse and availability resolution are anonymous: patients book as
    // guests.
    let public_routes = Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/calendar", get(handlers::get_calendar))
        .route("/{doctor_id}/slots", get(handlers::get_available_slots))
        .route("/{doctor_id}/slots/status", get(handlers::get_slot_statuses));

    // Profile and availability management are doctor-scoped.
    let protected_routes = Router::new()
        .route("/", post(handlers::register_doctor))
        .route("/{doctor_id}", patch(handlers::update_doctor))
        .route("/{doctor_id}/blocked-slots", post(handlers::block_slots))
        .route("/{doctor_id}/blocked-slots", get(handlers::list_blocked_slots))
        .route(
            "/{doctor_id}/blocked-slots/{blocked_slot_id}",
            delete(handlers::unblock_slot),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
