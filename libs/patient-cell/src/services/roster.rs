// libs/patient-cell/src/services/roster.rs
use std::collections::HashMap;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use appointment_cell::models::Appointment;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthorizationContext;

use crate::models::{PatientError, PatientRecord};

/// Materializes a doctor's patient roster from their appointment history.
pub struct PatientRosterService {
    supabase: SupabaseClient,
}

impl PatientRosterService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_patients(
        &self,
        ctx: &AuthorizationContext,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<PatientRecord>, PatientError> {
        if !ctx.can_act_for_doctor(&doctor_id) {
            return Err(PatientError::Unauthorized);
        }

        debug!("Building patient roster for doctor {}", doctor_id);

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=appointment_date.desc",
            doctor_id
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| PatientError::Store(e.to_string()))?;

        let appointments: Vec<Appointment> = rows
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| PatientError::Store(e.to_string())))
            .collect::<Result<_, _>>()?;

        Ok(build_roster(&appointments))
    }
}

/// Fold appointments into per-patient records, keyed by email (phone when
/// the booking carried no email), preserving first-seen order.
pub fn build_roster(appointments: &[Appointment]) -> Vec<PatientRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, PatientRecord> = HashMap::new();

    for appointment in appointments {
        let key = appointment
            .patient_email
            .clone()
            .filter(|email| !email.is_empty())
            .unwrap_or_else(|| appointment.patient_phone.clone());

        match by_key.get_mut(&key) {
            Some(record) => {
                record.appointment_count += 1;
                if record.last_visit < Some(appointment.appointment_date) {
                    record.last_visit = Some(appointment.appointment_date);
                }
            }
            None => {
                order.push(key.clone());
                by_key.insert(
                    key,
                    PatientRecord {
                        name: appointment.patient_name.clone(),
                        email: appointment.patient_email.clone().unwrap_or_default(),
                        phone: appointment.patient_phone.clone(),
                        appointment_count: 1,
                        last_visit: Some(appointment.appointment_date),
                    },
                );
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use appointment_cell::models::AppointmentStatus;
    use chrono::{NaiveDate, Utc};

    fn appointment(email: Option<&str>, name: &str, phone: &str, date: (i32, u32, u32)) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            doctor_name: "Dr. Test".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            time_slot: "10:00 AM".to_string(),
            patient_name: name.to_string(),
            patient_email: email.map(str::to_string),
            patient_phone: phone.to_string(),
            patient_age: None,
            patient_gender: None,
            reason: None,
            notes: None,
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_repeat_visits_collapse_into_one_record() {
        let appointments = vec![
            appointment(Some("asha@example.com"), "Asha Rao", "111", (2025, 6, 10)),
            appointment(Some("ravi@example.com"), "Ravi Iyer", "222", (2025, 6, 9)),
            appointment(Some("asha@example.com"), "Asha Rao", "111", (2025, 5, 1)),
        ];

        let roster = build_roster(&appointments);

        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].email, "asha@example.com");
        assert_eq!(roster[0].appointment_count, 2);
        assert_eq!(
            roster[0].last_visit,
            NaiveDate::from_ymd_opt(2025, 6, 10)
        );
        assert_eq!(roster[1].appointment_count, 1);
    }

    #[test]
    fn test_missing_email_falls_back_to_phone_key() {
        let appointments = vec![
            appointment(None, "Walk In", "333", (2025, 6, 10)),
            appointment(None, "Walk In", "333", (2025, 6, 11)),
            appointment(None, "Other Walk In", "444", (2025, 6, 11)),
        ];

        let roster = build_roster(&appointments);

        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].appointment_count, 2);
        assert_eq!(roster[0].email, "");
    }

    #[test]
    fn test_first_seen_order_is_preserved() {
        let appointments = vec![
            appointment(Some("c@example.com"), "C", "1", (2025, 6, 12)),
            appointment(Some("a@example.com"), "A", "2", (2025, 6, 11)),
            appointment(Some("b@example.com"), "B", "3", (2025, 6, 10)),
            appointment(Some("a@example.com"), "A", "2", (2025, 6, 9)),
        ];

        let emails: Vec<String> = build_roster(&appointments)
            .into_iter()
            .map(|r| r.email)
            .collect();

        assert_eq!(emails, vec!["c@example.com", "a@example.com", "b@example.com"]);
    }
}
