//! Detection data model and batch reduction.

pub mod processor;
pub mod region;

pub use processor::{DisplayValue, RangingResultProcessor};
pub use region::{DetectedBeacon, DetectionBatch, Identifier, Region};
