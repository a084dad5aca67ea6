//! Platform integration seam: capability queries, remediation requests, and
//! the precondition gate that sequences them before a scan may start.

pub mod adapter;
pub mod gate;

pub use adapter::{LocationProvider, PlatformAdapter, PlatformError, RadioState};
pub use gate::{PreconditionGate, ReadyOutcome};
