// libs/patient-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the patient roster. This is a read-model keyed by patient
/// email, rebuilt from the appointment store on each request - never
/// authoritative patient identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub appointment_count: i64,
    pub last_visit: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Not authorized to view this doctor's patients")]
    Unauthorized,

    #[error("Store error: {0}")]
    Store(String),
}
