// libs/doctor-cell/src/services/calendar.rs
use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::models::SelectableDay;

/// Decides which calendar dates a patient may pick at all. Slot-level
/// filtering happens later, in the availability resolver.
pub struct CalendarService;

impl CalendarService {
    pub fn new() -> Self {
        Self
    }

    /// Weekday index with 0 = Sunday .. 6 = Saturday.
    pub fn day_of_week(date: NaiveDate) -> i32 {
        match date.weekday() {
            Weekday::Sun => 0,
            Weekday::Mon => 1,
            Weekday::Tue => 2,
            Weekday::Wed => 3,
            Weekday::Thu => 4,
            Weekday::Fri => 5,
            Weekday::Sat => 6,
        }
    }

    /// Rules are checked in order and the first failing one wins; there is
    /// no distinct "why" reported, a date is simply selectable or not.
    /// `min_date` is a calendar day - callers normalize instants to
    /// start-of-day before calling.
    pub fn is_date_selectable(
        &self,
        date: NaiveDate,
        min_date: NaiveDate,
        max_date: Option<NaiveDate>,
        disabled_dates: &HashSet<NaiveDate>,
        working_days: &[i32],
    ) -> bool {
        if date < min_date {
            return false;
        }

        if let Some(max) = max_date {
            if date > max {
                return false;
            }
        }

        if !working_days.contains(&Self::day_of_week(date)) {
            return false;
        }

        if disabled_dates.contains(&date) {
            return false;
        }

        true
    }

    /// The browsable date strip: `horizon_days` consecutive days starting at
    /// `from`, each flagged with its selectability.
    pub fn selectable_dates(
        &self,
        from: NaiveDate,
        horizon_days: i64,
        disabled_dates: &HashSet<NaiveDate>,
        working_days: &[i32],
    ) -> Vec<SelectableDay> {
        let max_date = from + Duration::days(horizon_days - 1);

        (0..horizon_days)
            .map(|offset| {
                let date = from + Duration::days(offset);
                SelectableDay {
                    date,
                    selectable: self.is_date_selectable(
                        date,
                        from,
                        Some(max_date),
                        disabled_dates,
                        working_days,
                    ),
                }
            })
            .collect()
    }
}

impl Default for CalendarService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sunday_not_selectable_on_mon_to_sat_schedule() {
        let service = CalendarService::new();
        let working_days = vec![1, 2, 3, 4, 5, 6];
        let no_disabled = HashSet::new();

        // 2025-06-08 is a Sunday, 2025-06-09 the Monday after.
        let sunday = date(2025, 6, 8);
        let monday = date(2025, 6, 9);
        let min = date(2025, 6, 1);

        assert!(!service.is_date_selectable(sunday, min, None, &no_disabled, &working_days));
        assert!(service.is_date_selectable(monday, min, None, &no_disabled, &working_days));
    }

    #[test]
    fn test_date_before_min_not_selectable() {
        let service = CalendarService::new();
        let working_days = vec![0, 1, 2, 3, 4, 5, 6];
        let no_disabled = HashSet::new();
        let min = date(2025, 6, 10);

        assert!(!service.is_date_selectable(date(2025, 6, 9), min, None, &no_disabled, &working_days));
        assert!(service.is_date_selectable(min, min, None, &no_disabled, &working_days));
    }

    #[test]
    fn test_date_past_max_not_selectable() {
        let service = CalendarService::new();
        let working_days = vec![0, 1, 2, 3, 4, 5, 6];
        let no_disabled = HashSet::new();
        let min = date(2025, 6, 1);
        let max = date(2025, 6, 30);

        assert!(service.is_date_selectable(date(2025, 6, 30), min, Some(max), &no_disabled, &working_days));
        assert!(!service.is_date_selectable(date(2025, 7, 1), min, Some(max), &no_disabled, &working_days));
    }

    #[test]
    fn test_disabled_date_wins_over_working_day() {
        let service = CalendarService::new();
        let working_days = vec![1, 2, 3, 4, 5, 6];
        let disabled: HashSet<NaiveDate> = [date(2025, 6, 9)].into_iter().collect();
        let min = date(2025, 6, 1);

        assert!(!service.is_date_selectable(date(2025, 6, 9), min, None, &disabled, &working_days));
    }

    #[test]
    fn test_selectable_dates_strip_length_and_flags() {
        let service = CalendarService::new();
        let working_days = vec![1, 2, 3, 4, 5, 6];
        let no_disabled = HashSet::new();

        // Strip starting Friday 2025-06-06: Sunday the 8th must be flagged out.
        let strip = service.selectable_dates(date(2025, 6, 6), 7, &no_disabled, &working_days);

        assert_eq!(strip.len(), 7);
        assert!(strip[0].selectable);
        assert!(!strip[2].selectable);
        assert_eq!(strip[2].date, date(2025, 6, 8));
    }
}
