//! Reduction of detection batches to a single indicator value.
//!
//! Policy: the last observation in delivery order wins, scaled at one display
//! unit per millimeter and clamped to the indicator range. An empty batch
//! yields no update, so the previous value persists across the brief misses
//! expected on a short fixed scan period.

use crate::ranging::region::DetectionBatch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Indicator position derived from the most recent detection batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DisplayValue(u32);

impl DisplayValue {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Computes the display value for each incoming batch.
pub struct RangingResultProcessor {
    indicator_max: u32,
}

impl RangingResultProcessor {
    pub fn new(indicator_max: u32) -> Self {
        Self { indicator_max }
    }

    pub fn indicator_max(&self) -> u32 {
        self.indicator_max
    }

    /// Reduce a batch to an indicator update. `None` means "no update": the
    /// batch was empty and the caller should keep the previous value.
    pub fn process(&self, batch: &DetectionBatch) -> Option<DisplayValue> {
        if batch.observations.is_empty() {
            return None;
        }

        let mut value = None;
        for beacon in &batch.observations {
            let scaled = (beacon.estimated_distance_m * 1000.0).round();
            let clamped = scaled.clamp(0.0, f64::from(self.indicator_max)) as u32;
            value = Some(DisplayValue(clamped));
        }
        value
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranging::region::{DetectedBeacon, Identifier, Region};

    fn batch(distances: &[f64]) -> DetectionBatch {
        let observations = distances
            .iter()
            .map(|d| DetectedBeacon {
                identifiers: vec![Identifier::new("beacon")],
                raw_signal: -65,
                estimated_distance_m: *d,
            })
            .collect();
        DetectionBatch::new(Region::match_all("r"), observations)
    }

    #[test]
    fn test_empty_batch_yields_no_update() {
        let processor = RangingResultProcessor::new(10_000);
        assert_eq!(processor.process(&batch(&[])), None);
    }

    #[test]
    fn test_last_observation_wins() {
        let processor = RangingResultProcessor::new(10_000);
        let value = processor.process(&batch(&[0.01, 0.05]));
        assert_eq!(value, Some(DisplayValue::new(50)));
    }

    #[test]
    fn test_single_observation_scaled_per_millimeter() {
        let processor = RangingResultProcessor::new(10_000);
        let value = processor.process(&batch(&[2.0]));
        assert_eq!(value, Some(DisplayValue::new(2000)));
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let processor = RangingResultProcessor::new(10_000);
        // 1.2345 m -> 1234.5 -> 1235
        let value = processor.process(&batch(&[1.2345]));
        assert_eq!(value, Some(DisplayValue::new(1235)));
    }

    #[test]
    fn test_value_clamped_to_indicator_max() {
        let processor = RangingResultProcessor::new(100);
        let value = processor.process(&batch(&[42.0]));
        assert_eq!(value, Some(DisplayValue::new(100)));
    }

    #[test]
    fn test_zero_distance_maps_to_zero() {
        let processor = RangingResultProcessor::new(10_000);
        let value = processor.process(&batch(&[0.0]));
        assert_eq!(value, Some(DisplayValue::new(0)));
    }

    #[test]
    fn test_order_matters_not_magnitude() {
        let processor = RangingResultProcessor::new(10_000);
        // The nearest beacon does not win; the last delivered one does.
        let value = processor.process(&batch(&[5.0, 0.1]));
        assert_eq!(value, Some(DisplayValue::new(100)));

        let value = processor.process(&batch(&[0.1, 5.0]));
        assert_eq!(value, Some(DisplayValue::new(5000)));
    }

    #[test]
    fn test_display_value_accessors() {
        let value = DisplayValue::new(50);
        assert_eq!(value.value(), 50);
        assert_eq!(format!("{}", value), "50");
    }

    #[test]
    fn test_indicator_max_accessor() {
        let processor = RangingResultProcessor::new(2500);
        assert_eq!(processor.indicator_max(), 2500);
    }
}
