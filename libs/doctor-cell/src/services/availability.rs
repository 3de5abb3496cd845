// libs/doctor-cell/src/services/availability.rs
use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::grid;
use crate::models::{AvailabilityError, Doctor, SlotAvailability, SlotStatus};
use crate::services::calendar::CalendarService;

/// How far ahead a patient may book, in days from today.
pub const BOOKING_HORIZON_DAYS: i64 = 90;

/// Computes the offerable slot subset for a (doctor, date) pair from the
/// catalog, the booked set and the blocked set.
pub struct AvailabilityService {
    supabase: SupabaseClient,
    calendar: CalendarService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            calendar: CalendarService::new(),
        }
    }

    /// The slots a patient can still pick for this doctor and date, in
    /// catalog order. Anonymous - booking needs no identity.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, AvailabilityError> {
        debug!("Resolving available slots for doctor {} on {}", doctor_id, date);

        let (booked, blocked) = futures::try_join!(
            self.booked_slots(doctor_id, date),
            self.blocked_slot_labels(doctor_id, date),
        )?;

        let is_today = date == now.date_naive();
        let slots = filter_available(grid::all_slots(), &booked, &blocked, is_today, now.time());

        debug!("{} of {} slots offerable", slots.len(), grid::all_slots().len());
        Ok(slots)
    }

    /// Per-slot status for the whole catalog, for UI affordance. Statuses
    /// other than `available` reject selection as a no-op.
    pub async fn slot_statuses(
        &self,
        doctor: &Doctor,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotAvailability>, AvailabilityError> {
        let (booked, blocked) = futures::try_join!(
            self.booked_slots(doctor.id, date),
            self.blocked_slot_labels(doctor.id, date),
        )?;

        let today = now.date_naive();
        let date_selectable = self.calendar.is_date_selectable(
            date,
            today,
            Some(today + Duration::days(BOOKING_HORIZON_DAYS)),
            &HashSet::new(),
            &doctor.working_days,
        );
        let is_today = date == today;

        let statuses = grid::all_slots()
            .iter()
            .map(|slot| SlotAvailability {
                time_slot: (*slot).to_string(),
                band: grid::band_of(slot).expect("catalog slot always has a band"),
                status: classify_slot(slot, &booked, &blocked, date_selectable, is_today, now.time()),
            })
            .collect();

        Ok(statuses)
    }

    /// Slot labels consumed by non-cancelled appointments for (doctor, date).
    /// Cancelled appointments free their slot for re-booking.
    async fn booked_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<HashSet<String>, AvailabilityError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&status=neq.cancelled&select=time_slot",
            doctor_id, date
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AvailabilityError::FetchFailed(e.to_string()))?;

        Ok(rows
            .iter()
            .filter_map(|row| row["time_slot"].as_str().map(str::to_string))
            .collect())
    }

    async fn blocked_slot_labels(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<HashSet<String>, AvailabilityError> {
        let path = format!(
            "/rest/v1/blocked_slots?doctor_id=eq.{}&blocked_date=eq.{}&select=time_slot",
            doctor_id, date
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AvailabilityError::FetchFailed(e.to_string()))?;

        Ok(rows
            .iter()
            .filter_map(|row| row["time_slot"].as_str().map(str::to_string))
            .collect())
    }
}

/// Keep a catalog slot iff it is in neither the booked nor the blocked set
/// and, on today's date, has not already elapsed. Order is preserved.
pub fn filter_available(
    catalog: &[&str],
    booked: &HashSet<String>,
    blocked: &HashSet<String>,
    is_today: bool,
    now_time: NaiveTime,
) -> Vec<String> {
    catalog
        .iter()
        .filter(|slot| !booked.contains(**slot) && !blocked.contains(**slot))
        .filter(|slot| !(is_today && grid::is_slot_elapsed(slot, now_time)))
        .map(|slot| (*slot).to_string())
        .collect()
}

/// Status precedence: blocked > booked > past (today only) > unavailable
/// (date itself not selectable) > available.
pub fn classify_slot(
    slot: &str,
    booked: &HashSet<String>,
    blocked: &HashSet<String>,
    date_selectable: bool,
    is_today: bool,
    now_time: NaiveTime,
) -> SlotStatus {
    if blocked.contains(slot) {
        SlotStatus::Blocked
    } else if booked.contains(slot) {
        SlotStatus::Booked
    } else if is_today && grid::is_slot_elapsed(slot, now_time) {
        SlotStatus::Past
    } else if !date_selectable {
        SlotStatus::Unavailable
    } else {
        SlotStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_set(slots: &[&str]) -> HashSet<String> {
        slots.iter().map(|s| s.to_string()).collect()
    }

    fn midnight() -> NaiveTime {
        NaiveTime::from_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_booked_slot_excluded_others_offered() {
        let booked = slot_set(&["10:00 AM"]);
        let blocked = HashSet::new();

        let available = filter_available(grid::all_slots(), &booked, &blocked, false, midnight());

        assert_eq!(available.len(), 17);
        assert!(!available.contains(&"10:00 AM".to_string()));
        assert!(available.contains(&"09:00 AM".to_string()));
        assert!(available.contains(&"10:30 AM".to_string()));
    }

    #[test]
    fn test_cancelled_booking_frees_slot() {
        // The caller derives the booked set from non-cancelled appointments
        // only, so a cancellation simply removes the label from the set.
        let blocked = HashSet::new();

        let before = filter_available(
            grid::all_slots(),
            &slot_set(&["10:00 AM"]),
            &blocked,
            false,
            midnight(),
        );
        let after = filter_available(grid::all_slots(), &HashSet::new(), &blocked, false, midnight());

        assert!(!before.contains(&"10:00 AM".to_string()));
        assert!(after.contains(&"10:00 AM".to_string()));
        assert_eq!(after.len(), 18);
    }

    #[test]
    fn test_blocked_slots_excluded_regardless_of_bookings() {
        let booked = HashSet::new();
        let blocked = slot_set(&["02:00 PM", "02:30 PM"]);

        let available = filter_available(grid::all_slots(), &booked, &blocked, false, midnight());

        assert_eq!(available.len(), 16);
        assert!(!available.contains(&"02:00 PM".to_string()));
        assert!(!available.contains(&"02:30 PM".to_string()));
    }

    #[test]
    fn test_result_preserves_catalog_order() {
        let booked = slot_set(&["09:30 AM", "04:00 PM"]);
        let blocked = slot_set(&["11:00 AM"]);

        let available = filter_available(grid::all_slots(), &booked, &blocked, false, midnight());

        let positions: Vec<usize> = available
            .iter()
            .map(|s| grid::all_slots().iter().position(|c| c == s).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();

        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_elapsed_slots_dropped_only_today() {
        let none = HashSet::new();
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

        let today = filter_available(grid::all_slots(), &none, &none, true, noon);
        let future_day = filter_available(grid::all_slots(), &none, &none, false, noon);

        // At exactly noon the 12:00 PM slot is already past.
        assert!(!today.contains(&"12:00 PM".to_string()));
        assert!(!today.contains(&"09:00 AM".to_string()));
        assert!(today.contains(&"12:30 PM".to_string()));
        assert_eq!(future_day.len(), 18);
    }

    #[test]
    fn test_status_precedence() {
        let booked = slot_set(&["10:00 AM", "11:00 AM"]);
        let blocked = slot_set(&["10:00 AM", "02:00 PM"]);
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

        // Blocked wins over booked.
        assert_eq!(
            classify_slot("10:00 AM", &booked, &blocked, true, true, noon),
            SlotStatus::Blocked
        );
        // Booked wins over past.
        assert_eq!(
            classify_slot("11:00 AM", &booked, &blocked, true, true, noon),
            SlotStatus::Booked
        );
        assert_eq!(
            classify_slot("09:00 AM", &booked, &blocked, true, true, noon),
            SlotStatus::Past
        );
        // Past applies only on today's date.
        assert_eq!(
            classify_slot("09:00 AM", &booked, &blocked, true, false, noon),
            SlotStatus::Available
        );
        assert_eq!(
            classify_slot("03:00 PM", &booked, &blocked, false, false, noon),
            SlotStatus::Unavailable
        );
        assert_eq!(
            classify_slot("03:00 PM", &booked, &blocked, true, false, noon),
            SlotStatus::Available
        );
    }
}
