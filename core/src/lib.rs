//! Beaconwatch core: precondition gating, scan session lifecycle, and
//! ranging result processing behind a single-consumer event loop.
//!
//! The crate is platform-agnostic. Hosts supply a [`PlatformAdapter`] for
//! capability queries and remediation, a [`BeaconEngine`] for scanning, and a
//! [`UiSink`] for presentation; the [`Controller`] wires them together.

pub mod config;
pub mod controller;
pub mod engine;
pub mod platform;
pub mod ranging;
pub mod session;

pub use config::{ConfigError, ScanConfig};
pub use controller::{ChannelListener, Controller, ControllerEvent, UiSink};
pub use engine::{
    BeaconEngine, EngineError, RangingListener, SimulatedBeacon, SimulatedEngine,
    SimulationConfig, ALTBEACON_LAYOUT,
};
pub use platform::{
    LocationProvider, PlatformAdapter, PlatformError, PreconditionGate, RadioState, ReadyOutcome,
};
pub use ranging::{DetectedBeacon, DetectionBatch, DisplayValue, Identifier, Region};
pub use session::{ScanSession, SessionState};
