// The daily slot catalog. Every bookable time is one of these fixed labels;
// equality is exact label match and no duration is derived from slot spacing.

use chrono::NaiveTime;

use crate::models::SlotBand;

/// The full catalog, chronological order. Two 30-minute bands with a
/// 01:00 PM - 02:00 PM lunch gap.
pub const TIME_SLOTS: [&str; 18] = [
    "09:00 AM", "09:30 AM",
    "10:00 AM", "10:30 AM",
    "11:00 AM", "11:30 AM",
    "12:00 PM", "12:30 PM",
    "02:00 PM", "02:30 PM",
    "03:00 PM", "03:30 PM",
    "04:00 PM", "04:30 PM",
    "05:00 PM", "05:30 PM",
    "06:00 PM", "06:30 PM",
];

const MORNING_SLOTS: [&str; 6] = [
    "09:00 AM", "09:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM",
];

const AFTERNOON_SLOTS: [&str; 6] = [
    "12:00 PM", "12:30 PM", "02:00 PM", "02:30 PM", "03:00 PM", "03:30 PM",
];

const EVENING_SLOTS: [&str; 6] = [
    "04:00 PM", "04:30 PM", "05:00 PM", "05:30 PM", "06:00 PM", "06:30 PM",
];

pub fn all_slots() -> &'static [&'static str] {
    &TIME_SLOTS
}

/// Static partition of the catalog; band order and in-band order are both
/// chronological.
pub fn slots_by_band() -> [(SlotBand, &'static [&'static str]); 3] {
    [
        (SlotBand::Morning, &MORNING_SLOTS),
        (SlotBand::Afternoon, &AFTERNOON_SLOTS),
        (SlotBand::Evening, &EVENING_SLOTS),
    ]
}

pub fn is_catalog_slot(label: &str) -> bool {
    TIME_SLOTS.contains(&label)
}

pub fn band_of(label: &str) -> Option<SlotBand> {
    if MORNING_SLOTS.contains(&label) {
        Some(SlotBand::Morning)
    } else if AFTERNOON_SLOTS.contains(&label) {
        Some(SlotBand::Afternoon)
    } else if EVENING_SLOTS.contains(&label) {
        Some(SlotBand::Evening)
    } else {
        None
    }
}

/// Parse a slot label into its start-of-slot wall-clock time.
pub fn slot_time(label: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(label, "%I:%M %p").ok()
}

/// A slot whose start time has been reached is already elapsed: a slot
/// exactly at the current wall-clock minute is not offerable.
pub fn is_slot_elapsed(label: &str, now: NaiveTime) -> bool {
    match slot_time(label) {
        Some(start) => start <= now,
        None => false,
    }
}
