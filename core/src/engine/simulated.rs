//! Simulated scanning engine.
//!
//! Emits synthetic detection batches on the configured scan period, with a
//! random walk on each beacon's distance and optional dropout to mimic the
//! missed cycles real hardware produces. Also carries failure hooks so tests
//! can exercise the controller's error paths.

use crate::engine::{BeaconEngine, EngineError, RangingListener};
use crate::ranging::{DetectedBeacon, DetectionBatch, Identifier, Region};
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

// Distances below this are treated as touching the antenna.
const MIN_DISTANCE_M: f64 = 0.01;

/// One synthetic transmitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedBeacon {
    pub identifiers: Vec<String>,
    /// Center of the random walk, in meters.
    pub base_distance_m: f64,
    /// Maximum per-cycle movement, in meters.
    pub wander_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub beacons: Vec<SimulatedBeacon>,
    /// Probability in [0, 1] that a beacon is missing from a given cycle.
    pub dropout_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            beacons: vec![SimulatedBeacon {
                identifiers: vec![
                    "2f234454-cf6d-4a0f-adf2-f4911ba9ffa6".to_string(),
                    "1".to_string(),
                    "1".to_string(),
                ],
                base_distance_m: 1.0,
                wander_m: 0.4,
            }],
            dropout_rate: 0.0,
        }
    }
}

struct Inner {
    listener: Option<Arc<dyn RangingListener>>,
    scan_period: Duration,
    beacon_layout: String,
    ranging_task: Option<JoinHandle<()>>,
    fail_start_ranging: bool,
    fail_stop_ranging: bool,
}

/// In-process engine backed by tokio timers instead of radio hardware.
pub struct SimulatedEngine {
    config: SimulationConfig,
    inner: Mutex<Inner>,
}

impl SimulatedEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                listener: None,
                scan_period: Duration::from_millis(1000),
                beacon_layout: String::new(),
                ranging_task: None,
                fail_start_ranging: false,
                fail_stop_ranging: false,
            }),
        }
    }

    /// Make the next `start_ranging` call fail.
    pub fn set_fail_start_ranging(&self, fail: bool) {
        self.inner.lock().fail_start_ranging = fail;
    }

    /// Make the next `stop_ranging` call fail.
    pub fn set_fail_stop_ranging(&self, fail: bool) {
        self.inner.lock().fail_stop_ranging = fail;
    }

    pub fn beacon_layout(&self) -> String {
        self.inner.lock().beacon_layout.clone()
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        if let Some(task) = self.inner.lock().ranging_task.take() {
            task.abort();
        }
    }
}

impl BeaconEngine for SimulatedEngine {
    fn configure(&self, beacon_layout: &str) {
        self.inner.lock().beacon_layout = beacon_layout.to_string();
    }

    fn set_scan_period(&self, period: Duration) {
        self.inner.lock().scan_period = period;
    }

    fn bind(&self, listener: Arc<dyn RangingListener>) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        inner.listener = Some(listener.clone());
        drop(inner);

        // Readiness is reported asynchronously, as a real engine would.
        tokio::spawn(async move {
            listener.on_connected();
        });
        Ok(())
    }

    fn start_ranging(&self, region: &Region) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();

        let listener = inner.listener.clone().ok_or(EngineError::NotBound)?;
        if inner.fail_start_ranging {
            return Err(EngineError::Communication {
                operation: "start_ranging",
                message: "simulated remote failure".to_string(),
            });
        }

        if let Some(task) = inner.ranging_task.take() {
            task.abort();
        }

        let region = region.clone();
        let beacons = self.config.beacons.clone();
        let dropout_rate = self.config.dropout_rate;
        let period = inner.scan_period;

        debug!(region = %region.name(), period_ms = period.as_millis() as u64, "simulated ranging started");

        inner.ranging_task = Some(tokio::spawn(async move {
            let mut distances: Vec<f64> =
                beacons.iter().map(|b| b.base_distance_m).collect();
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let batch = next_batch(&region, &beacons, &mut distances, dropout_rate);
                listener.on_ranging_update(batch);
            }
        }));
        Ok(())
    }

    fn stop_ranging(&self, region: &Region) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();

        if inner.fail_stop_ranging {
            return Err(EngineError::Communication {
                operation: "stop_ranging",
                message: "simulated remote failure".to_string(),
            });
        }

        if let Some(task) = inner.ranging_task.take() {
            task.abort();
        }
        debug!(region = %region.name(), "simulated ranging stopped");
        Ok(())
    }

    fn unbind(&self) {
        let mut inner = self.inner.lock();
        if let Some(task) = inner.ranging_task.take() {
            task.abort();
        }
        inner.listener = None;
    }
}

/// Advance the random walk one cycle and build the batch for `region`.
fn next_batch(
    region: &Region,
    beacons: &[SimulatedBeacon],
    distances: &mut [f64],
    dropout_rate: f64,
) -> DetectionBatch {
    let mut rng = rand::thread_rng();
    let mut observations = Vec::new();

    for (beacon, distance) in beacons.iter().zip(distances.iter_mut()) {
        if beacon.wander_m > 0.0 {
            *distance += rng.gen_range(-beacon.wander_m..=beacon.wander_m);
        }
        *distance = distance.max(MIN_DISTANCE_M);

        if dropout_rate > 0.0 && rng.gen::<f64>() < dropout_rate {
            continue;
        }

        let detected = DetectedBeacon {
            identifiers: beacon.identifiers.iter().map(Identifier::new).collect(),
            raw_signal: signal_for_distance(*distance),
            estimated_distance_m: *distance,
        };
        if region.matches(&detected) {
            observations.push(detected);
        }
    }

    DetectionBatch::new(region.clone(), observations)
}

// Log-distance path loss with a -59 dBm reference at one meter.
fn signal_for_distance(distance_m: f64) -> i32 {
    (-59.0 - 20.0 * distance_m.max(MIN_DISTANCE_M).log10()).round() as i32
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    enum TestEvent {
        Connected,
        Batch(DetectionBatch),
    }

    struct ForwardingListener {
        tx: mpsc::UnboundedSender<TestEvent>,
    }

    impl RangingListener for ForwardingListener {
        fn on_connected(&self) {
            let _ = self.tx.send(TestEvent::Connected);
        }

        fn on_connection_lost(&self) {}

        fn on_ranging_update(&self, batch: DetectionBatch) {
            let _ = self.tx.send(TestEvent::Batch(batch));
        }
    }

    fn listener_pair() -> (Arc<ForwardingListener>, mpsc::UnboundedReceiver<TestEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(ForwardingListener { tx }), rx)
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<TestEvent>) -> TestEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for engine event")
            .expect("engine event channel closed")
    }

    fn steady_config() -> SimulationConfig {
        SimulationConfig {
            beacons: vec![SimulatedBeacon {
                identifiers: vec!["aaaa".to_string(), "1".to_string(), "2".to_string()],
                base_distance_m: 2.0,
                wander_m: 0.0,
            }],
            dropout_rate: 0.0,
        }
    }

    #[tokio::test]
    async fn test_bind_reports_connected_asynchronously() {
        let engine = SimulatedEngine::new(steady_config());
        let (listener, mut rx) = listener_pair();

        engine.bind(listener).expect("bind failed");
        assert!(matches!(recv(&mut rx).await, TestEvent::Connected));
    }

    #[tokio::test]
    async fn test_start_ranging_requires_bind() {
        let engine = SimulatedEngine::new(steady_config());
        let result = engine.start_ranging(&Region::match_all("r"));
        assert!(matches!(result, Err(EngineError::NotBound)));
    }

    #[tokio::test]
    async fn test_ranging_updates_carry_observations() {
        let engine = SimulatedEngine::new(steady_config());
        engine.set_scan_period(Duration::from_millis(10));
        let (listener, mut rx) = listener_pair();
        engine.bind(listener).expect("bind failed");
        recv(&mut rx).await;

        engine
            .start_ranging(&Region::match_all("test-region"))
            .expect("start_ranging failed");

        for _ in 0..3 {
            match recv(&mut rx).await {
                TestEvent::Batch(batch) => {
                    assert_eq!(batch.region.name(), "test-region");
                    assert_eq!(batch.observations.len(), 1);
                    let beacon = &batch.observations[0];
                    assert!((beacon.estimated_distance_m - 2.0).abs() < f64::EPSILON);
                    // -59 - 20*log10(2) rounds to -65.
                    assert_eq!(beacon.raw_signal, -65);
                }
                TestEvent::Connected => panic!("unexpected connected event"),
            }
        }
    }

    #[tokio::test]
    async fn test_non_matching_region_yields_empty_batches() {
        let engine = SimulatedEngine::new(steady_config());
        engine.set_scan_period(Duration::from_millis(10));
        let (listener, mut rx) = listener_pair();
        engine.bind(listener).expect("bind failed");
        recv(&mut rx).await;

        let region = Region::new("other", vec![Identifier::new("bbbb")]);
        engine.start_ranging(&region).expect("start_ranging failed");

        match recv(&mut rx).await {
            TestEvent::Batch(batch) => assert!(batch.observations.is_empty()),
            TestEvent::Connected => panic!("unexpected connected event"),
        }
    }

    #[tokio::test]
    async fn test_start_ranging_failure_hook() {
        let engine = SimulatedEngine::new(steady_config());
        let (listener, mut rx) = listener_pair();
        engine.bind(listener).expect("bind failed");
        recv(&mut rx).await;

        engine.set_fail_start_ranging(true);
        let result = engine.start_ranging(&Region::match_all("r"));
        assert!(matches!(
            result,
            Err(EngineError::Communication {
                operation: "start_ranging",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_stop_ranging_failure_hook() {
        let engine = SimulatedEngine::new(steady_config());
        engine.set_fail_stop_ranging(true);
        let result = engine.stop_ranging(&Region::match_all("r"));
        assert!(matches!(
            result,
            Err(EngineError::Communication {
                operation: "stop_ranging",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_stop_without_active_ranging_is_ok() {
        let engine = SimulatedEngine::new(steady_config());
        assert!(engine.stop_ranging(&Region::match_all("r")).is_ok());
    }

    #[tokio::test]
    async fn test_configure_records_layout() {
        let engine = SimulatedEngine::new(steady_config());
        engine.configure(crate::engine::ALTBEACON_LAYOUT);
        assert_eq!(engine.beacon_layout(), crate::engine::ALTBEACON_LAYOUT);
    }

    #[test]
    fn test_distance_never_walks_below_minimum() {
        let beacons = vec![SimulatedBeacon {
            identifiers: vec!["aaaa".to_string()],
            base_distance_m: 0.02,
            wander_m: 0.5,
        }];
        let mut distances = vec![0.02];
        let region = Region::match_all("r");

        for _ in 0..100 {
            let batch = next_batch(&region, &beacons, &mut distances, 0.0);
            assert!(distances[0] >= MIN_DISTANCE_M);
            if let Some(beacon) = batch.observations.first() {
                assert!(beacon.estimated_distance_m >= MIN_DISTANCE_M);
            }
        }
    }
}
