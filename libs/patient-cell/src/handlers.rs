// libs/patient-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthorizationContext, User};
use shared_models::error::AppError;

use crate::models::PatientError;
use crate::services::roster::PatientRosterService;

fn map_patient_err(e: PatientError) -> AppError {
    match e {
        PatientError::Unauthorized => {
            AppError::Auth("Not authorized to view this doctor's patients".to_string())
        }
        PatientError::Store(msg) => AppError::Store(msg),
    }
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthorizationContext::from_user(&user);
    let service = PatientRosterService::new(&state);

    let patients = service
        .list_patients(&ctx, doctor_id, auth.token())
        .await
        .map_err(map_patient_err)?;

    Ok(Json(json!({ "patients": patients })))
}
