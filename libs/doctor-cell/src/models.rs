// libs/doctor-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// DOCTOR PROFILE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
    pub about: Option<String>,
    pub consultation_duration: i32,
    pub working_days: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn works_on(&self, weekday_index: i32) -> bool {
        self.working_days.contains(&weekday_index)
    }
}

/// The specializations patients can browse by.
pub const SPECIALIZATIONS: [&str; 18] = [
    "General Physician",
    "Cardiologist",
    "Dermatologist",
    "Pediatrician",
    "Orthopedic",
    "Neurologist",
    "Gynecologist",
    "ENT Specialist",
    "Ophthalmologist",
    "Psychiatrist",
    "Dentist",
    "Urologist",
    "Gastroenterologist",
    "Pulmonologist",
    "Endocrinologist",
    "Oncologist",
    "Nephrologist",
    "Rheumatologist",
];

/// Allowed per-consultation durations, minutes.
pub const CONSULTATION_DURATIONS: [i32; 5] = [15, 20, 30, 45, 60];

/// Monday through Saturday.
pub const DEFAULT_WORKING_DAYS: [i32; 6] = [1, 2, 3, 4, 5, 6];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDoctorRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
    pub about: Option<String>,
    pub consultation_duration: Option<i32>,
    pub working_days: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
    pub about: Option<String>,
    pub consultation_duration: Option<i32>,
    pub working_days: Option<Vec<i32>>,
}

// ==============================================================================
// SLOT AND CALENDAR MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotBand {
    Morning,
    Afternoon,
    Evening,
}

impl fmt::Display for SlotBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotBand::Morning => write!(f, "morning"),
            SlotBand::Afternoon => write!(f, "afternoon"),
            SlotBand::Evening => write!(f, "evening"),
        }
    }
}

/// UI affordance for one catalog slot. Precedence when several apply:
/// blocked > booked > past > unavailable > available. Only `available`
/// accepts a selection; the rest reject it as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Blocked,
    Booked,
    Past,
    Unavailable,
    Available,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub time_slot: String,
    pub band: SlotBand,
    pub status: SlotStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectableDay {
    pub date: NaiveDate,
    pub selectable: bool,
}

// ==============================================================================
// BLOCKED SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedSlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub blocked_date: NaiveDate,
    pub time_slot: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSlotsRequest {
    pub date: NaiveDate,
    pub slots: Vec<String>,
    pub reason: Option<String>,
}

/// Outcome of a batch block: no store transaction is available, so slots are
/// written one-by-one and the caller learns exactly which ones landed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchBlockOutcome {
    pub blocked: Vec<BlockedSlot>,
    pub failed: Vec<FailedBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedBlock {
    pub time_slot: String,
    pub error: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("A doctor with this email already exists")]
    EmailTaken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not authorized to manage this doctor")]
    Unauthorized,

    #[error("Store error: {0}")]
    Store(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    /// The booked/blocked fetch failed. The resolver surfaces this instead
    /// of guessing: a wrongly-open slot list risks a double booking.
    #[error("Failed to fetch availability data: {0}")]
    FetchFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BlockingError {
    #[error("Blocked slot not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not authorized to manage this doctor's availability")]
    Unauthorized,

    #[error("Store error: {0}")]
    Store(String),
}
