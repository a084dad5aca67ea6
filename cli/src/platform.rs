// Scripted platform adapter for the CLI
//
// There is no real permission dialog or radio switch on a desktop terminal,
// so the CLI plays the user: every remediation request is answered from a
// script built out of command-line flags, and the answer is reported back
// through the controller's event channel exactly as a host UI would.

use beaconwatch_core::{ControllerEvent, LocationProvider, PlatformAdapter, PlatformError, RadioState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::info;

/// How the scripted user answers each prompt.
#[derive(Debug, Clone, Copy)]
pub struct PlatformScript {
    /// Permission state before the first request.
    pub permission_granted: bool,
    /// Answer to the permission prompt.
    pub grant_on_request: bool,
    /// Location provider state at startup.
    pub location_enabled: bool,
    /// Whether the user enables location while the settings screen is open.
    pub fix_location_on_open: bool,
    /// Radio adapter state at startup.
    pub radio: RadioState,
    /// Answer to the radio-enable prompt.
    pub accept_radio_enable: bool,
}

pub struct ScriptedPlatform {
    script: PlatformScript,
    permission_granted: AtomicBool,
    location_enabled: AtomicBool,
    radio: Mutex<RadioState>,
    events: mpsc::UnboundedSender<ControllerEvent>,
}

impl ScriptedPlatform {
    pub fn new(script: PlatformScript, events: mpsc::UnboundedSender<ControllerEvent>) -> Self {
        Self {
            permission_granted: AtomicBool::new(script.permission_granted),
            location_enabled: AtomicBool::new(script.location_enabled),
            radio: Mutex::new(script.radio),
            script,
            events,
        }
    }
}

impl PlatformAdapter for ScriptedPlatform {
    fn requires_runtime_permission(&self) -> bool {
        true
    }

    fn is_permission_granted(&self) -> bool {
        self.permission_granted.load(Ordering::SeqCst)
    }

    fn request_permission(&self) {
        let granted = self.script.grant_on_request;
        info!(granted, "scripted user answered the permission prompt");
        if granted {
            self.permission_granted.store(true, Ordering::SeqCst);
        }
        let _ = self
            .events
            .send(ControllerEvent::PermissionDecision { granted });
    }

    fn is_location_provider_enabled(
        &self,
        _provider: LocationProvider,
    ) -> Result<bool, PlatformError> {
        Ok(self.location_enabled.load(Ordering::SeqCst))
    }

    fn open_location_settings(&self) {
        if self.script.fix_location_on_open {
            info!("scripted user enabled location and returned from settings");
            self.location_enabled.store(true, Ordering::SeqCst);
            let _ = self.events.send(ControllerEvent::LocationSettingsClosed);
        } else {
            // The scripted user never comes back; the session stays parked
            // until a stop request cancels it.
            info!("location settings opened, nothing changed");
        }
    }

    fn radio_state(&self) -> RadioState {
        *self.radio.lock()
    }

    fn request_radio_enable(&self) {
        let accepted = self.script.accept_radio_enable;
        info!(accepted, "scripted user answered the radio-enable prompt");
        if accepted {
            *self.radio.lock() = RadioState::Enabled;
        }
        let _ = self
            .events
            .send(ControllerEvent::RadioEnableDecision { accepted });
    }

    fn disable_radio(&self) {
        info!("radio disabled");
        *self.radio.lock() = RadioState::Disabled;
    }

    fn post_notification(&self, title: &str, body: &str) {
        info!(title, body, "notification posted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_script() -> PlatformScript {
        PlatformScript {
            permission_granted: true,
            grant_on_request: true,
            location_enabled: true,
            fix_location_on_open: true,
            radio: RadioState::Enabled,
            accept_radio_enable: true,
        }
    }

    #[test]
    fn test_permission_grant_mutates_state_and_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let script = PlatformScript {
            permission_granted: false,
            ..ready_script()
        };
        let platform = ScriptedPlatform::new(script, tx);

        assert!(!platform.is_permission_granted());
        platform.request_permission();
        assert!(platform.is_permission_granted());
        assert!(matches!(
            rx.try_recv(),
            Ok(ControllerEvent::PermissionDecision { granted: true })
        ));
    }

    #[test]
    fn test_permission_denial_leaves_state_untouched() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let script = PlatformScript {
            permission_granted: false,
            grant_on_request: false,
            ..ready_script()
        };
        let platform = ScriptedPlatform::new(script, tx);

        platform.request_permission();
        assert!(!platform.is_permission_granted());
        assert!(matches!(
            rx.try_recv(),
            Ok(ControllerEvent::PermissionDecision { granted: false })
        ));
    }

    #[test]
    fn test_unfixed_location_settings_send_no_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let script = PlatformScript {
            location_enabled: false,
            fix_location_on_open: false,
            ..ready_script()
        };
        let platform = ScriptedPlatform::new(script, tx);

        platform.open_location_settings();
        assert!(rx.try_recv().is_err());
        assert_eq!(
            platform
                .is_location_provider_enabled(LocationProvider::Network)
                .unwrap(),
            false
        );
    }

    #[test]
    fn test_radio_enable_acceptance() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let script = PlatformScript {
            radio: RadioState::Disabled,
            ..ready_script()
        };
        let platform = ScriptedPlatform::new(script, tx);

        platform.request_radio_enable();
        assert_eq!(platform.radio_state(), RadioState::Enabled);
        assert!(matches!(
            rx.try_recv(),
            Ok(ControllerEvent::RadioEnableDecision { accepted: true })
        ));

        platform.disable_radio();
        assert_eq!(platform.radio_state(), RadioState::Disabled);
    }
}
