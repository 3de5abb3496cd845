// libs/appointment-cell/src/services/booking.rs
use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::grid;
use shared_config::AppConfig;
use shared_database::supabase::{StoreError, SupabaseClient};
use shared_models::auth::AuthorizationContext;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    BookAppointmentRequest,
};
use crate::services::lifecycle::AppointmentLifecycleService;

static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        Regex::new(r"^\+?[0-9][0-9 \-()]{6,19}$").expect("phone pattern is valid")
    })
}

/// The sole creation path for appointments, plus the doctor-side queries and
/// lifecycle transitions over them.
pub struct AppointmentBookingService {
    supabase: SupabaseClient,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Book a slot for an anonymous patient. The created appointment is
    /// always `pending`, whatever status the caller supplied.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment with doctor {} on {} at {}",
            request.doctor_id, request.appointment_date, request.time_slot
        );

        validate_booking_request(&request, Utc::now().date_naive())?;

        let doctor_name = self.doctor_display_name(request.doctor_id).await?;

        // Conditional insert: at most one non-cancelled appointment may hold
        // a (doctor, date, slot). The store's partial unique index backs this
        // check for writers racing between the read and the insert.
        if self
            .slot_taken(request.doctor_id, request.appointment_date, &request.time_slot)
            .await?
        {
            warn!(
                "Slot {} on {} already taken for doctor {}",
                request.time_slot, request.appointment_date, request.doctor_id
            );
            return Err(AppointmentError::SlotConflict);
        }

        let appointment_data = json!({
            "doctor_id": request.doctor_id,
            "doctor_name": doctor_name,
            "appointment_date": request.appointment_date,
            "time_slot": request.time_slot,
            "patient_name": request.patient.name,
            "patient_email": request.patient.email,
            "patient_phone": request.patient.phone,
            "patient_age": request.patient.age,
            "patient_gender": request.patient.gender,
            "reason": request.reason,
            "notes": null,
            "status": AppointmentStatus::Pending,
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
                "/rest/v1/appointments",
                None,
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AppointmentError::SlotConflict,
                other => AppointmentError::Store(other.to_string()),
            })?;

        let created = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Store("Store returned no appointment row".to_string()))?;

        let appointment: Appointment =
            serde_json::from_value(created).map_err(|e| AppointmentError::Store(e.to_string()))?;

        info!("Appointment {} booked as pending", appointment.id);
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::Store(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(row).map_err(|e| AppointmentError::Store(e.to_string()))
    }

    /// Doctor-scoped listing, newest date first.
    pub async fn search_appointments(
        &self,
        ctx: &AuthorizationContext,
        query: &AppointmentSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if !ctx.can_act_for_doctor(&query.doctor_id) {
            return Err(AppointmentError::Unauthorized);
        }

        let mut path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=appointment_date.desc,time_slot.asc",
            query.doctor_id
        );

        if let Some(status) = &query.status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        if let Some(date) = query.date {
            path.push_str(&format!("&appointment_date=eq.{}", date));
        }
        if let Some(from) = query.from_date {
            path.push_str(&format!("&appointment_date=gte.{}", from));
        }
        if let Some(to) = query.to_date {
            path.push_str(&format!("&appointment_date=lte.{}", to));
        }

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Store(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| AppointmentError::Store(e.to_string()))
            })
            .collect()
    }

    /// pending -> completed, with optional consultation notes.
    pub async fn complete_appointment(
        &self,
        ctx: &AuthorizationContext,
        appointment_id: Uuid,
        notes: Option<&str>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(ctx, appointment_id, AppointmentStatus::Completed, notes, auth_token)
            .await
    }

    /// pending -> cancelled. The freed slot becomes offerable again
    /// immediately; the record itself is never deleted.
    pub async fn cancel_appointment(
        &self,
        ctx: &AuthorizationContext,
        appointment_id: Uuid,
        reason: Option<&str>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(ctx, appointment_id, AppointmentStatus::Cancelled, reason, auth_token)
            .await
    }

    /// Shared transition path: authorization, state-machine validation, then
    /// a status patch that never touches doctor/date/slot.
    async fn transition(
        &self,
        ctx: &AuthorizationContext,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        notes: Option<&str>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, Some(auth_token)).await?;

        if !ctx.can_act_for_doctor(&current.doctor_id) {
            return Err(AppointmentError::Unauthorized);
        }

        self.lifecycle
            .validate_status_transition(&current.status, &new_status)?;

        let mut update_data = serde_json::Map::new();
        update_data.insert("status".to_string(), json!(new_status));
        if let Some(notes) = notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
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
            .map_err(|e| AppointmentError::Store(e.to_string()))?;

        let updated = result.into_iter().next().ok_or(AppointmentError::NotFound)?;
        let appointment: Appointment =
            serde_json::from_value(updated).map_err(|e| AppointmentError::Store(e.to_string()))?;

        debug!("Appointment {} is now {}", appointment.id, appointment.status);
        Ok(appointment)
    }

    async fn doctor_display_name(&self, doctor_id: Uuid) -> Result<String, AppointmentError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=name", doctor_id);

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppointmentError::Store(e.to_string()))?;

        rows.into_iter()
            .next()
            .and_then(|row| row["name"].as_str().map(str::to_string))
            .ok_or(AppointmentError::DoctorNotFound)
    }

    async fn slot_taken(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time_slot: &str,
    ) -> Result<bool, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&time_slot=eq.{}&status=neq.cancelled&select=id",
            doctor_id,
            date,
            urlencoding::encode(time_slot)
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppointmentError::Store(e.to_string()))?;

        Ok(!rows.is_empty())
    }
}

/// Field checks run before anything touches the store: required patient
/// fields, a plausible phone number, a catalog slot, a non-past date.
pub fn validate_booking_request(
    request: &BookAppointmentRequest,
    today: NaiveDate,
) -> Result<(), AppointmentError> {
    if request.patient.name.trim().is_empty() {
        return Err(AppointmentError::ValidationError(
            "Patient name is required".to_string(),
        ));
    }

    if request.patient.phone.trim().is_empty() {
        return Err(AppointmentError::ValidationError(
            "Patient phone is required".to_string(),
        ));
    }

    if !phone_regex().is_match(request.patient.phone.trim()) {
        return Err(AppointmentError::ValidationError(
            "Patient phone does not look like a phone number".to_string(),
        ));
    }

    if !grid::is_catalog_slot(&request.time_slot) {
        return Err(AppointmentError::ValidationError(format!(
            "Unknown time slot: {}",
            request.time_slot
        )));
    }

    if request.appointment_date < today {
        return Err(AppointmentError::ValidationError(
            "Appointment date cannot be in the past".to_string(),
        ));
    }

    Ok(())
}
