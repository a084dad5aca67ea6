//! Detection data model: identifiers, regions, and detection batches.
//!
//! A `Region` scopes which beacons a ranging session reports. Identifiers are
//! opaque tokens taken from the beacon advertisement; a region with no
//! identifier filters matches every beacon in range.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, comparable token for one component of a beacon's advertised
/// identity (e.g. UUID, major, minor).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Scope of detection for a ranging session.
///
/// Immutable after construction; built once at controller initialization and
/// registered with the engine for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    name: String,
    identifier_filters: Vec<Identifier>,
}

impl Region {
    pub fn new(name: impl Into<String>, identifier_filters: Vec<Identifier>) -> Self {
        Self {
            name: name.into(),
            identifier_filters,
        }
    }

    /// A region with no identifier filters, matching every beacon.
    pub fn match_all(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier_filters(&self) -> &[Identifier] {
        &self.identifier_filters
    }

    /// Positional prefix match: every filter must equal the beacon identifier
    /// at the same position. No filters matches everything.
    pub fn matches(&self, beacon: &DetectedBeacon) -> bool {
        if self.identifier_filters.is_empty() {
            return true;
        }
        if beacon.identifiers.len() < self.identifier_filters.len() {
            return false;
        }
        self.identifier_filters
            .iter()
            .zip(beacon.identifiers.iter())
            .all(|(filter, id)| filter == id)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One observation of a beacon, produced by the scanning engine and consumed
/// immediately; never retained across batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedBeacon {
    /// Advertised identity components.
    pub identifiers: Vec<Identifier>,
    /// Received signal strength in dBm.
    pub raw_signal: i32,
    /// Engine-estimated distance in meters, >= 0.
    pub estimated_distance_m: f64,
}

/// One scan cycle's worth of observations, tagged with the region they were
/// observed in. Delivered asynchronously, one batch per cycle; may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBatch {
    pub region: Region,
    pub observations: Vec<DetectedBeacon>,
}

impl DetectionBatch {
    pub fn new(region: Region, observations: Vec<DetectedBeacon>) -> Self {
        Self {
            region,
            observations,
        }
    }

    pub fn empty(region: Region) -> Self {
        Self::new(region, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
