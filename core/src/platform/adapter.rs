//! Platform adapter seam.
//!
//! Read-only capability queries plus fire-and-forget remediation requests.
//! Answers to requests never come back as return values: the host delivers
//! them later as controller events, the same way a permission dialog or a
//! radio-enable prompt reports back on a real device.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors from platform capability queries.
#[derive(Debug, Error, Clone)]
pub enum PlatformError {
    #[error("location provider query failed: {0}")]
    LocationQueryFailed(String),
}

// ============================================================================
// ENUMS
// ============================================================================

/// A source of location data the platform may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationProvider {
    /// Network-based positioning (cell / Wi-Fi).
    Network,
    /// Satellite-based positioning.
    Satellite,
}

impl fmt::Display for LocationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "Network"),
            Self::Satellite => write!(f, "Satellite"),
        }
    }
}

/// Presence and power state of the short-range radio adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadioState {
    /// No radio hardware on this device.
    Absent,
    /// Hardware present but powered off.
    Disabled,
    /// Powered on and ready for scanning.
    Enabled,
}

impl fmt::Display for RadioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "Absent"),
            Self::Disabled => write!(f, "Disabled"),
            Self::Enabled => write!(f, "Enabled"),
        }
    }
}

// ============================================================================
// PLATFORM ADAPTER
// ============================================================================

/// Host platform surface consumed by the precondition gate and controller.
#[cfg_attr(test, automock)]
pub trait PlatformAdapter: Send + Sync {
    /// Whether this platform gates scanning behind explicit user consent.
    /// Platforms without runtime permissions skip the permission check.
    fn requires_runtime_permission(&self) -> bool;

    /// Current grant status of the scanning permission.
    fn is_permission_granted(&self) -> bool;

    /// Ask the user for the scanning permission. The decision arrives later
    /// as a `PermissionDecision` event.
    fn request_permission(&self);

    /// Whether the given location provider is enabled.
    fn is_location_provider_enabled(
        &self,
        provider: LocationProvider,
    ) -> Result<bool, PlatformError>;

    /// Navigate the user to the location settings screen. The return arrives
    /// later as a `LocationSettingsClosed` event.
    fn open_location_settings(&self);

    /// Presence and power state of the radio adapter.
    fn radio_state(&self) -> RadioState;

    /// Ask the user to power on the radio. The decision arrives later as a
    /// `RadioEnableDecision` event.
    fn request_radio_enable(&self);

    /// Power the radio adapter down.
    fn disable_radio(&self);

    /// Post a notification. Exposed as a platform capability; the live
    /// detection path never calls it.
    fn post_notification(&self, title: &str, body: &str);
}
