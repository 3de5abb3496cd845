// libs/doctor-cell/src/services/doctor.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthorizationContext;

use crate::models::{
    Doctor, DoctorError, RegisterDoctorRequest, UpdateDoctorRequest, CONSULTATION_DURATIONS,
    DEFAULT_WORKING_DAYS, SPECIALIZATIONS,
};

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Create the doctor's profile row, keyed by the authenticated user id.
    pub async fn register_doctor(
        &self,
        ctx: &AuthorizationContext,
        request: RegisterDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Registering doctor profile for user {}", ctx.user_id);

        let doctor_id = Uuid::parse_str(&ctx.user_id)
            .map_err(|_| DoctorError::ValidationError("Invalid user id".to_string()))?;

        if request.name.trim().is_empty() {
            return Err(DoctorError::ValidationError("Name is required".to_string()));
        }
        if request.email.trim().is_empty() {
            return Err(DoctorError::ValidationError("Email is required".to_string()));
        }
        if !SPECIALIZATIONS.contains(&request.specialization.as_str()) {
            return Err(DoctorError::ValidationError(format!(
                "Unknown specialization: {}",
                request.specialization
            )));
        }

        let consultation_duration = request.consultation_duration.unwrap_or(30);
        let working_days = request
            .working_days
            .unwrap_or_else(|| DEFAULT_WORKING_DAYS.to_vec());
        validate_duration(consultation_duration)?;
        validate_working_days(&working_days)?;

        if self.find_by_email(&request.email, auth_token).await?.is_some() {
            return Err(DoctorError::EmailTaken);
        }

        let doctor_data = json!({
            "id": doctor_id,
            "name": request.name,
            "email": request.email,
            "phone": request.phone,
            "specialization": request.specialization,
            "clinic_name": request.clinic_name,
            "clinic_address": request.clinic_address,
            "about": request.about,
            "consultation_duration": consultation_duration,
            "working_days": working_days,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctors",
                Some(auth_token),
                Some(doctor_data),
                Some(headers),
            )
            .await
            .map_err(|e| DoctorError::Store(e.to_string()))?;

        let created = result
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::Store("Store returned no doctor row".to_string()))?;

        serde_json::from_value(created).map_err(|e| DoctorError::Store(e.to_string()))
    }

    /// Public profile lookup, no identity required.
    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| DoctorError::Store(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(row).map_err(|e| DoctorError::Store(e.to_string()))
    }

    /// Public browse list, optionally narrowed to one specialization.
    pub async fn list_doctors(
        &self,
        specialization: Option<&str>,
    ) -> Result<Vec<Doctor>, DoctorError> {
        let mut path = "/rest/v1/doctors?order=name.asc".to_string();
        if let Some(specialization) = specialization {
            path.push_str(&format!(
                "&specialization=eq.{}",
                urlencoding::encode(specialization)
            ));
        }

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| DoctorError::Store(e.to_string()))?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| DoctorError::Store(e.to_string())))
            .collect()
    }

    /// Settings update, owner only. Only provided fields are written.
    pub async fn update_doctor(
        &self,
        ctx: &AuthorizationContext,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        if !ctx.can_act_for_doctor(&doctor_id) {
            return Err(DoctorError::Unauthorized);
        }

        // Confirm the row exists before patching so a bad id is a 404, not a
        // silent empty update.
        self.get_doctor(doctor_id).await?;

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(DoctorError::ValidationError("Name cannot be empty".to_string()));
            }
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(specialization) = request.specialization {
            if !SPECIALIZATIONS.contains(&specialization.as_str()) {
                return Err(DoctorError::ValidationError(format!(
                    "Unknown specialization: {}",
                    specialization
                )));
            }
            update_data.insert("specialization".to_string(), json!(specialization));
        }
        if let Some(clinic_name) = request.clinic_name {
            update_data.insert("clinic_name".to_string(), json!(clinic_name));
        }
        if let Some(clinic_address) = request.clinic_address {
            update_data.insert("clinic_address".to_string(), json!(clinic_address));
        }
        if let Some(about) = request.about {
            update_data.insert("about".to_string(), json!(about));
        }
        if let Some(duration) = request.consultation_duration {
            validate_duration(duration)?;
            update_data.insert("consultation_duration".to_string(), json!(duration));
        }
        if let Some(working_days) = request.working_days {
            validate_working_days(&working_days)?;
            update_data.insert("working_days".to_string(), json!(working_days));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(headers),
            )
            .await
            .map_err(|e| DoctorError::Store(e.to_string()))?;

        let updated = result.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(updated).map_err(|e| DoctorError::Store(e.to_string()))
    }

    pub async fn find_by_email(
        &self,
        email: &str,
        auth_token: &str,
    ) -> Result<Option<Doctor>, DoctorError> {
        let path = format!("/rest/v1/doctors?email=eq.{}", email);

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| DoctorError::Store(e.to_string()))?;

        rows.into_iter()
            .next()
            .map(|row| serde_json::from_value(row).map_err(|e| DoctorError::Store(e.to_string())))
            .transpose()
    }
}

fn validate_duration(consultation_duration: i32) -> Result<(), DoctorError> {
    if !CONSULTATION_DURATIONS.contains(&consultation_duration) {
        return Err(DoctorError::ValidationError(format!(
            "Consultation duration must be one of {:?} minutes",
            CONSULTATION_DURATIONS
        )));
    }

    Ok(())
}

fn validate_working_days(working_days: &[i32]) -> Result<(), DoctorError> {
    if working_days.is_empty() {
        return Err(DoctorError::ValidationError(
            "At least one working day is required".to_string(),
        ));
    }

    if working_days.iter().any(|day| !(0..=6).contains(day)) {
        return Err(DoctorError::ValidationError(
            "Working days must be between 0 (Sunday) and 6 (Saturday)".to_string(),
        ));
    }

    Ok(())
}
