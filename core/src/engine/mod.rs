//! Scanning engine seam.
//!
//! The controller drives an engine through a narrow trait: configure, bind,
//! start ranging, stop ranging, unbind. Binding is asynchronous; the engine
//! reports readiness through the listener, never through `bind`'s return.

use crate::ranging::{DetectionBatch, Region};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod simulated;

pub use simulated::{SimulatedBeacon, SimulatedEngine, SimulationConfig};

/// Parser layout for the AltBeacon advertisement format.
pub const ALTBEACON_LAYOUT: &str = "m:2-3=beac,i:4-19,i:20-21,i:22-23,p:24-24,d:25-25";

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("engine communication failed during {operation}: {message}")]
    Communication {
        operation: &'static str,
        message: String,
    },

    #[error("engine is not bound")]
    NotBound,
}

// ============================================================================
// TRAITS
// ============================================================================

/// Callbacks the engine invokes as scanning proceeds. Implementations must
/// tolerate being called from the engine's own tasks.
pub trait RangingListener: Send + Sync {
    /// The engine has finished binding and can accept ranging commands.
    fn on_connected(&self);

    /// The engine process went away; any active ranging is gone with it.
    fn on_connection_lost(&self);

    /// One scan cycle completed for `batch.region`.
    fn on_ranging_update(&self, batch: DetectionBatch);
}

/// A beacon scanning engine.
pub trait BeaconEngine: Send + Sync {
    /// Install the advertisement parser layout. Takes effect on next bind.
    fn configure(&self, beacon_layout: &str);

    /// Set the duration of one scan cycle.
    fn set_scan_period(&self, period: Duration);

    /// Begin the asynchronous bind. Readiness arrives via
    /// `RangingListener::on_connected`, not here.
    fn bind(&self, listener: Arc<dyn RangingListener>) -> Result<(), EngineError>;

    /// Start delivering ranging updates for `region`.
    fn start_ranging(&self, region: &Region) -> Result<(), EngineError>;

    /// Stop delivering ranging updates for `region`.
    fn stop_ranging(&self, region: &Region) -> Result<(), EngineError>;

    /// Release the engine. Safe to call when not bound.
    fn unbind(&self);
}
