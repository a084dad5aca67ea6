//! Precondition sequencing for scan startup.
//!
//! Checks run in a fixed order (permission, location service, radio) and the
//! first unmet condition wins: remediating a later condition while an earlier
//! one is unmet is pointless. The gate is read-only; all remediation side
//! effects are driven by the controller from the returned outcome.

use crate::platform::adapter::{LocationProvider, PlatformAdapter, RadioState};
use std::sync::Arc;
use tracing::warn;

/// Result of a readiness evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// All preconditions met; scanning may start.
    Ready,
    /// The scanning permission has not been granted.
    NeedsPermissionPrompt,
    /// No location provider is enabled.
    NeedsLocationSettings,
    /// Radio hardware present but powered off.
    NeedsRadioEnable,
    /// No radio hardware; fatal for this attempt, not retryable.
    Unsupported,
}

pub struct PreconditionGate {
    platform: Arc<dyn PlatformAdapter>,
}

impl PreconditionGate {
    pub fn new(platform: Arc<dyn PlatformAdapter>) -> Self {
        Self { platform }
    }

    /// Evaluate all preconditions in order. Fast, synchronous, no side
    /// effects beyond read-only queries; safe to call repeatedly.
    pub fn ensure_ready(&self) -> ReadyOutcome {
        if self.platform.requires_runtime_permission() && !self.platform.is_permission_granted() {
            return ReadyOutcome::NeedsPermissionPrompt;
        }

        if !self.any_location_provider_enabled() {
            return ReadyOutcome::NeedsLocationSettings;
        }

        match self.platform.radio_state() {
            RadioState::Absent => ReadyOutcome::Unsupported,
            RadioState::Disabled => ReadyOutcome::NeedsRadioEnable,
            RadioState::Enabled => ReadyOutcome::Ready,
        }
    }

    // A provider query error counts as disabled rather than failing the caller.
    fn any_location_provider_enabled(&self) -> bool {
        [LocationProvider::Network, LocationProvider::Satellite]
            .into_iter()
            .any(|provider| {
                self.platform
                    .is_location_provider_enabled(provider)
                    .unwrap_or_else(|err| {
                        warn!(%provider, error = %err, "location provider query failed");
                        false
                    })
            })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::adapter::{MockPlatformAdapter, PlatformError};

    fn gate_with(
        permission_granted: bool,
        location_enabled: bool,
        radio: RadioState,
    ) -> PreconditionGate {
        let mut platform = MockPlatformAdapter::new();
        platform
            .expect_requires_runtime_permission()
            .returning(|| true);
        platform
            .expect_is_permission_granted()
            .returning(move || permission_granted);
        platform
            .expect_is_location_provider_enabled()
            .returning(move |_| Ok(location_enabled));
        platform.expect_radio_state().returning(move || radio);
        PreconditionGate::new(Arc::new(platform))
    }

    #[test]
    fn test_all_preconditions_met() {
        let gate = gate_with(true, true, RadioState::Enabled);
        assert_eq!(gate.ensure_ready(), ReadyOutcome::Ready);
    }

    #[test]
    fn test_first_unmet_condition_wins_for_all_combinations() {
        for permission in [false, true] {
            for location in [false, true] {
                for radio in [RadioState::Absent, RadioState::Disabled, RadioState::Enabled] {
                    let expected = if !permission {
                        ReadyOutcome::NeedsPermissionPrompt
                    } else if !location {
                        ReadyOutcome::NeedsLocationSettings
                    } else {
                        match radio {
                            RadioState::Absent => ReadyOutcome::Unsupported,
                            RadioState::Disabled => ReadyOutcome::NeedsRadioEnable,
                            RadioState::Enabled => ReadyOutcome::Ready,
                        }
                    };

                    let gate = gate_with(permission, location, radio);
                    assert_eq!(
                        gate.ensure_ready(),
                        expected,
                        "permission={}, location={}, radio={}",
                        permission,
                        location,
                        radio
                    );
                }
            }
        }
    }

    #[test]
    fn test_permission_check_skipped_when_not_required() {
        let mut platform = MockPlatformAdapter::new();
        platform
            .expect_requires_runtime_permission()
            .returning(|| false);
        // is_permission_granted must not be consulted at all.
        platform.expect_is_permission_granted().times(0);
        platform
            .expect_is_location_provider_enabled()
            .returning(|_| Ok(true));
        platform
            .expect_radio_state()
            .returning(|| RadioState::Enabled);

        let gate = PreconditionGate::new(Arc::new(platform));
        assert_eq!(gate.ensure_ready(), ReadyOutcome::Ready);
    }

    #[test]
    fn test_location_query_error_fails_open_to_disabled() {
        let mut platform = MockPlatformAdapter::new();
        platform
            .expect_requires_runtime_permission()
            .returning(|| true);
        platform.expect_is_permission_granted().returning(|| true);
        platform
            .expect_is_location_provider_enabled()
            .returning(|_| Err(PlatformError::LocationQueryFailed("query error".to_string())));
        platform
            .expect_radio_state()
            .returning(|| RadioState::Enabled);

        let gate = PreconditionGate::new(Arc::new(platform));
        assert_eq!(gate.ensure_ready(), ReadyOutcome::NeedsLocationSettings);
    }

    #[test]
    fn test_single_enabled_provider_is_sufficient() {
        let mut platform = MockPlatformAdapter::new();
        platform
            .expect_requires_runtime_permission()
            .returning(|| true);
        platform.expect_is_permission_granted().returning(|| true);
        platform
            .expect_is_location_provider_enabled()
            .returning(|provider| Ok(provider == LocationProvider::Satellite));
        platform
            .expect_radio_state()
            .returning(|| RadioState::Enabled);

        let gate = PreconditionGate::new(Arc::new(platform));
        assert_eq!(gate.ensure_ready(), ReadyOutcome::Ready);
    }

    #[test]
    fn test_repeated_evaluation_never_caches() {
        // A denial is not sticky: the gate re-queries on every call.
        let granted = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let granted_reader = granted.clone();

        let mut platform = MockPlatformAdapter::new();
        platform
            .expect_requires_runtime_permission()
            .returning(|| true);
        platform
            .expect_is_permission_granted()
            .returning(move || granted_reader.load(std::sync::atomic::Ordering::SeqCst));
        platform
            .expect_is_location_provider_enabled()
            .returning(|_| Ok(true));
        platform
            .expect_radio_state()
            .returning(|| RadioState::Enabled);

        let gate = PreconditionGate::new(Arc::new(platform));
        assert_eq!(gate.ensure_ready(), ReadyOutcome::NeedsPermissionPrompt);

        granted.store(true, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(gate.ensure_ready(), ReadyOutcome::Ready);
    }
}
