// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthorizationContext, User};
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentSearchQuery, BookAppointmentRequest, CancelAppointmentRequest,
    CompleteAppointmentRequest,
};
use crate::services::booking::AppointmentBookingService;
use crate::services::stats::AppointmentStatsService;

fn map_appointment_err(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::SlotConflict => {
            AppError::Conflict("Appointment slot is no longer available".to_string())
        }
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::InvalidStatusTransition(status) => AppError::BadRequest(format!(
            "Appointment cannot be modified in current status: {}",
            status
        )),
        AppointmentError::Unauthorized => {
            AppError::Auth("Not authorized to manage this appointment".to_string())
        }
        AppointmentError::Store(msg) => AppError::Store(msg),
    }
}

// ==============================================================================
// PUBLIC BOOKING HANDLER
// ==============================================================================

/// Anonymous patient booking. On a slot conflict the client re-resolves
/// availability; its selected date/slot state is preserved client-side so
/// the patient can retry without re-selecting.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .book_appointment(request)
        .await
        .map_err(map_appointment_err)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

// ==============================================================================
// DOCTOR-SCOPED HANDLERS (authenticated)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .get_appointment(appointment_id, Some(auth.token()))
        .await
        .map_err(map_appointment_err)?;

    if !ctx.can_act_for_doctor(&appointment.doctor_id) {
        return Err(AppError::Auth(
            "Not authorized to manage this appointment".to_string(),
        ));
    }

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    let service = AppointmentBookingService::new(&state);

    let appointments = service
        .search_appointments(&ctx, &query, auth.token())
        .await
        .map_err(map_appointment_err)?;

    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CompleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .complete_appointment(&ctx, appointment_id, request.notes.as_deref(), auth.token())
        .await
        .map_err(map_appointment_err)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .cancel_appointment(&ctx, appointment_id, request.reason.as_deref(), auth.token())
        .await
        .map_err(map_appointment_err)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_stats(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    let service = AppointmentStatsService::new(&state);

    let stats = service
        .doctor_stats(&ctx, doctor_id, auth.token())
        .await
        .map_err(map_appointment_err)?;

    Ok(Json(json!({ "stats": stats })))
}
