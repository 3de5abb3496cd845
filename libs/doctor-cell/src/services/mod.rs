pub mod availability;
pub mod blocking;
pub mod calendar;
pub mod doctor;

pub use availability::AvailabilityService;
pub use blocking::SlotBlockingService;
pub use calendar::CalendarService;
pub use doctor::DoctorService;
