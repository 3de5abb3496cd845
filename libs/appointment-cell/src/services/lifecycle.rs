// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// The appointment state machine: `pending` is the only live state,
/// everything else is terminal. Transitions on a terminal appointment are
/// rejected rather than treated as no-ops.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current_status, new_status);

        let valid_transitions = self.get_valid_transitions(current_status);

        if !valid_transitions.contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition(*current_status));
        }

        Ok(())
    }

    pub fn get_valid_transitions(
        &self,
        current_status: &AppointmentStatus,
    ) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::NoShow => vec![],
        }
    }

    pub fn is_terminal(&self, status: &AppointmentStatus) -> bool {
        self.get_valid_transitions(status).is_empty()
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_pending_can_complete_and_cancel() {
        let service = AppointmentLifecycleService::new();

        assert!(service
            .validate_status_transition(&AppointmentStatus::Pending, &AppointmentStatus::Completed)
            .is_ok());
        assert!(service
            .validate_status_transition(&AppointmentStatus::Pending, &AppointmentStatus::Cancelled)
            .is_ok());
        assert!(service
            .validate_status_transition(&AppointmentStatus::Pending, &AppointmentStatus::NoShow)
            .is_ok());
    }

    #[test]
    fn test_cancel_on_cancelled_is_rejected() {
        let service = AppointmentLifecycleService::new();

        let result = service
            .validate_status_transition(&AppointmentStatus::Cancelled, &AppointmentStatus::Cancelled);

        assert_matches!(
            result,
            Err(AppointmentError::InvalidStatusTransition(AppointmentStatus::Cancelled))
        );
    }

    #[test]
    fn test_terminal_states_allow_nothing() {
        let service = AppointmentLifecycleService::new();
        let terminals = [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ];

        for status in terminals {
            assert!(service.is_terminal(&status));
            assert!(service.get_valid_transitions(&status).is_empty());
            assert!(service
                .validate_status_transition(&status, &AppointmentStatus::Pending)
                .is_err());
        }

        assert!(!service.is_terminal(&AppointmentStatus::Pending));
    }
}
