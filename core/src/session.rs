//! Scan session lifecycle.
//!
//! A `ScanSession` owns the engine-facing half of one scan attempt: bind,
//! wait for the engine to connect, range, stop. Remediation waits (permission
//! dialog, settings screen, radio prompt) are session states too, so a stop
//! request can cancel a pending continuation the same way it cancels an
//! active scan.

use crate::engine::{BeaconEngine, EngineError, RangingListener};
use crate::ranging::Region;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

// ============================================================================
// SESSION STATE
// ============================================================================

/// Where a scan attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No scan in progress and nothing pending.
    Idle,
    /// Waiting on the user's permission decision.
    AwaitingPermission,
    /// Waiting for the user to return from location settings.
    AwaitingLocationService,
    /// Waiting on the user's radio-enable decision.
    AwaitingRadio,
    /// Bound to the engine, waiting for it to report connected.
    Bound,
    /// Ranging updates are flowing.
    Ranging,
    /// Teardown in progress.
    Stopping,
}

impl SessionState {
    /// Whether the session is parked on a remediation continuation.
    pub fn is_awaiting(&self) -> bool {
        matches!(
            self,
            Self::AwaitingPermission | Self::AwaitingLocationService | Self::AwaitingRadio
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingPermission => write!(f, "AwaitingPermission"),
            Self::AwaitingLocationService => write!(f, "AwaitingLocationService"),
            Self::AwaitingRadio => write!(f, "AwaitingRadio"),
            Self::Bound => write!(f, "Bound"),
            Self::Ranging => write!(f, "Ranging"),
            Self::Stopping => write!(f, "Stopping"),
        }
    }
}

// ============================================================================
// SCAN SESSION
// ============================================================================

pub struct ScanSession {
    engine: Arc<dyn BeaconEngine>,
    region: Region,
    scan_period: Duration,
    state: SessionState,
}

impl ScanSession {
    pub fn new(engine: Arc<dyn BeaconEngine>, region: Region, scan_period: Duration) -> Self {
        Self {
            engine,
            region,
            scan_period,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Park the session until the permission decision arrives.
    pub fn await_permission(&mut self) {
        self.state = SessionState::AwaitingPermission;
    }

    /// Park the session until the user returns from location settings.
    pub fn await_location_service(&mut self) {
        self.state = SessionState::AwaitingLocationService;
    }

    /// Park the session until the radio-enable decision arrives.
    pub fn await_radio(&mut self) {
        self.state = SessionState::AwaitingRadio;
    }

    /// Leave a remediation wait. No effect outside the awaiting states.
    pub fn clear_await(&mut self) {
        if self.state.is_awaiting() {
            self.state = SessionState::Idle;
        }
    }

    /// Bind to the engine. Returns `Ok(true)` when the bind was issued,
    /// `Ok(false)` when a session was already in progress and the call was a
    /// no-op. Ranging begins later, when the engine reports connected.
    pub fn start(&mut self, listener: Arc<dyn RangingListener>) -> Result<bool, EngineError> {
        if self.state != SessionState::Idle {
            debug!(state = %self.state, "start ignored, session already active");
            return Ok(false);
        }

        self.engine.set_scan_period(self.scan_period);
        self.engine.bind(listener)?;
        self.state = SessionState::Bound;
        Ok(true)
    }

    /// Engine reported connected. Returns `Ok(true)` when ranging started,
    /// `Ok(false)` when the event was stale and ignored. On a ranging start
    /// failure the session unwinds back to `Idle`.
    pub fn on_engine_connected(&mut self) -> Result<bool, EngineError> {
        if self.state != SessionState::Bound {
            debug!(state = %self.state, "ignoring stale engine-connected event");
            return Ok(false);
        }

        match self.engine.start_ranging(&self.region) {
            Ok(()) => {
                self.state = SessionState::Ranging;
                Ok(true)
            }
            Err(err) => {
                self.engine.unbind();
                self.state = SessionState::Idle;
                Err(err)
            }
        }
    }

    /// Tear down whatever is in flight. Returns `Ok(true)` when something
    /// was cancelled or stopped, `Ok(false)` when there was nothing to do.
    /// A stop-ranging failure does not halt teardown: the unbind still runs
    /// and the state still reaches `Idle`, but the error is returned so the
    /// caller can surface it.
    pub fn stop(&mut self) -> Result<bool, EngineError> {
        match self.state {
            SessionState::Idle | SessionState::Stopping => Ok(false),
            SessionState::AwaitingPermission
            | SessionState::AwaitingLocationService
            | SessionState::AwaitingRadio => {
                debug!(state = %self.state, "cancelling pending continuation");
                self.state = SessionState::Idle;
                Ok(true)
            }
            SessionState::Bound | SessionState::Ranging => {
                self.state = SessionState::Stopping;
                let result = self.engine.stop_ranging(&self.region);
                self.engine.unbind();
                self.state = SessionState::Idle;
                result.map(|_| true)
            }
        }
    }

    /// The engine went away. Returns `true` when an active session was torn
    /// down by the loss.
    pub fn on_connection_lost(&mut self) -> bool {
        match self.state {
            SessionState::Bound | SessionState::Ranging | SessionState::Stopping => {
                warn!(state = %self.state, "engine connection lost");
                self.engine.unbind();
                self.state = SessionState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Whether a batch delivered now should be processed.
    pub fn is_ranging(&self) -> bool {
        self.state == SessionState::Ranging
    }
}

// ============================================================================
// TESTS
// ============================================================================
