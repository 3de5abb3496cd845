// libs/doctor-cell/src/handlers.rs
use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{NaiveDate, Utc};
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthorizationContext, User};
use shared_models::error::AppError;

use crate::models::{
    AvailabilityError, BlockSlotsRequest, BlockingError, DoctorError, RegisterDoctorRequest,
    UpdateDoctorRequest,
};
use crate::services::availability::{AvailabilityService, BOOKING_HORIZON_DAYS};
use crate::services::blocking::SlotBlockingService;
use crate::services::calendar::CalendarService;
use crate::services::doctor::DoctorService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct DoctorListQuery {
    pub specialization: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BlockedSlotsQuery {
    pub date: Option<NaiveDate>,
}

fn map_doctor_err(e: DoctorError) -> AppError {
    match e {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::EmailTaken => {
            AppError::Conflict("A doctor with this email already exists".to_string())
        }
        DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
        DoctorError::Unauthorized => {
            AppError::Auth("Not authorized to manage this doctor".to_string())
        }
        DoctorError::Store(msg) => AppError::Store(msg),
    }
}

fn map_blocking_err(e: BlockingError) -> AppError {
    match e {
        BlockingError::NotFound => AppError::NotFound("Blocked slot not found".to_string()),
        BlockingError::ValidationError(msg) => AppError::ValidationError(msg),
        BlockingError::Unauthorized => {
            AppError::Auth("Not authorized to manage this doctor's availability".to_string())
        }
        BlockingError::Store(msg) => AppError::Store(msg),
    }
}

fn map_availability_err(e: AvailabilityError) -> AppError {
    match e {
        // Never degrade a failed fetch into "all slots open".
        AvailabilityError::FetchFailed(msg) => AppError::Upstream(msg),
    }
}

// ==============================================================================
// PUBLIC BROWSE AND AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);

    let doctors = service
        .list_doctors(query.specialization.as_deref())
        .await
        .map_err(map_doctor_err)?;

    Ok(Json(json!({ "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);

    let doctor = service.get_doctor(doctor_id).await.map_err(map_doctor_err)?;

    Ok(Json(json!({ "doctor": doctor })))
}

/// The offerable slot subset for a doctor/date, catalog order preserved.
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    let slots = service
        .available_slots(doctor_id, query.date, Utc::now())
        .await
        .map_err(map_availability_err)?;

    Ok(Json(json!({
        "date": query.date,
        "available_slots": slots
    })))
}

/// Per-slot status for the whole catalog (UI affordance).
#[axum::debug_handler]
pub async fn get_slot_statuses(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state)
        .get_doctor(doctor_id)
        .await
        .map_err(map_doctor_err)?;

    let statuses = AvailabilityService::new(&state)
        .slot_statuses(&doctor, query.date, Utc::now())
        .await
        .map_err(map_availability_err)?;

    Ok(Json(json!({
        "date": query.date,
        "slots": statuses
    })))
}

/// The browsable date strip for a doctor, today onward.
#[axum::debug_handler]
pub async fn get_calendar(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state)
        .get_doctor(doctor_id)
        .await
        .map_err(map_doctor_err)?;

    let horizon = query
        .days
        .unwrap_or(14)
        .clamp(1, BOOKING_HORIZON_DAYS);

    let days = CalendarService::new().selectable_dates(
        Utc::now().date_naive(),
        horizon,
        &HashSet::new(),
        &doctor.working_days,
    );

    Ok(Json(json!({ "days": days })))
}

// ==============================================================================
// DOCTOR-SCOPED HANDLERS (authenticated)
// ==============================================================================

#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    let service = DoctorService::new(&state);

    let doctor = service
        .register_doctor(&ctx, request, auth.token())
        .await
        .map_err(map_doctor_err)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    let service = DoctorService::new(&state);

    let doctor = service
        .update_doctor(&ctx, doctor_id, request, auth.token())
        .await
        .map_err(map_doctor_err)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

/// Batch block: reports per-slot success/failure instead of one boolean.
#[axum::debug_handler]
pub async fn block_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<BlockSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    let service = SlotBlockingService::new(&state);

    let outcome = service
        .block_slots(
            &ctx,
            doctor_id,
            request.date,
            &request.slots,
            request.reason.as_deref(),
            auth.token(),
        )
        .await
        .map_err(map_blocking_err)?;

    Ok(Json(json!({
        "success": outcome.failed.is_empty(),
        "blocked": outcome.blocked,
        "failed": outcome.failed
    })))
}

#[axum::debug_handler]
pub async fn list_blocked_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<BlockedSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    let service = SlotBlockingService::new(&state);

    let blocked = service
        .list_blocked_slots(&ctx, doctor_id, query.date, auth.token())
        .await
        .map_err(map_blocking_err)?;

    Ok(Json(json!({ "blocked_slots": blocked })))
}

#[axum::debug_handler]
pub async fn unblock_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((doctor_id, blocked_slot_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    if !ctx.can_act_for_doctor(&doctor_id) {
        return Err(AppError::Auth(
            "Not authorized to manage this doctor's availability".to_string(),
        ));
    }

    let service = SlotBlockingService::new(&state);

    service
        .unblock_slot(&ctx, blocked_slot_id, auth.token())
        .await
        .map_err(map_blocking_err)?;

    Ok(Json(json!({ "success": true })))
}
