pub mod roster;

pub use roster::PatientRosterService;
