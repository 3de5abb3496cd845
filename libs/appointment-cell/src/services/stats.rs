// libs/appointment-cell/src/services/stats.rs
use chrono::{Datelike, Duration, NaiveDate, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthorizationContext;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, DoctorStats};

/// Dashboard counters for a doctor, computed from the full appointment
/// history on each request.
pub struct AppointmentStatsService {
    supabase: SupabaseClient,
}

impl AppointmentStatsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn doctor_stats(
        &self,
        ctx: &AuthorizationContext,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<DoctorStats, AppointmentError> {
        if !ctx.can_act_for_doctor(&doctor_id) {
            return Err(AppointmentError::Unauthorized);
        }

        debug!("Computing stats for doctor {}", doctor_id);

        let path = format!("/rest/v1/appointments?doctor_id=eq.{}", doctor_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Store(e.to_string()))?;

        let appointments: Vec<Appointment> = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| AppointmentError::Store(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        Ok(summarize(&appointments, Utc::now().date_naive()))
    }
}

/// Fold the appointment list into dashboard counters. The week runs Sunday
/// through today.
pub fn summarize(appointments: &[Appointment], today: NaiveDate) -> DoctorStats {
    let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);

    let mut stats = DoctorStats {
        total: appointments.len() as i64,
        pending: 0,
        completed: 0,
        cancelled: 0,
        today: 0,
        this_week: 0,
    };

    for appointment in appointments {
        match appointment.status {
            AppointmentStatus::Pending => stats.pending += 1,
            AppointmentStatus::Completed => stats.completed += 1,
            AppointmentStatus::Cancelled => stats.cancelled += 1,
            AppointmentStatus::NoShow => {}
        }

        if appointment.appointment_date == today {
            stats.today += 1;
        }

        if appointment.appointment_date >= week_start && appointment.appointment_date <= today {
            stats.this_week += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn appointment(date: NaiveDate, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            doctor_name: "Dr. Test".to_string(),
            appointment_date: date,
            time_slot: "10:00 AM".to_string(),
            patient_name: "Test Patient".to_string(),
            patient_email: None,
            patient_phone: "+91 91234 56789".to_string(),
            patient_age: None,
            patient_gender: None,
            reason: None,
            notes: None,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_counts_by_status() {
        // 2025-06-11 is a Wednesday; the week starts Sunday 2025-06-08.
        let today = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        let last_month = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();

        let appointments = vec![
            appointment(today, AppointmentStatus::Pending),
            appointment(monday, AppointmentStatus::Completed),
            appointment(last_month, AppointmentStatus::Cancelled),
            appointment(last_month, AppointmentStatus::Completed),
        ];

        let stats = summarize(&appointments, today);

        assert_eq!(
            stats,
            DoctorStats {
                total: 4,
                pending: 1,
                completed: 2,
                cancelled: 1,
                today: 1,
                this_week: 2,
            }
        );
    }

    #[test]
    fn test_future_dates_do_not_count_toward_week() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();

        let appointments = vec![appointment(saturday, AppointmentStatus::Pending)];
        let stats = summarize(&appointments, today);

        assert_eq!(stats.this_week, 0);
        assert_eq!(stats.pending, 1);
    }

    #[test]
    fn test_empty_history() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        let stats = summarize(&[], today);

        assert_eq!(stats.total, 0);
        assert_eq!(stats.today, 0);
    }
}
