//! Detection controller: the composition root.
//!
//! All inputs converge on one event channel with the controller as its only
//! consumer: user actions, remediation outcomes from the platform, and
//! engine callbacks forwarded by `ChannelListener`. Transitions run on the
//! single control task, so the session state machine needs no locking and no
//! transition can interleave with another.

use crate::config::{ConfigError, ScanConfig};
use crate::engine::{BeaconEngine, RangingListener};
use crate::platform::{PlatformAdapter, PreconditionGate, RadioState, ReadyOutcome};
use crate::ranging::{DetectionBatch, DisplayValue, Identifier, RangingResultProcessor, Region};
use crate::session::{ScanSession, SessionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

// ============================================================================
// USER-VISIBLE MESSAGES
// ============================================================================

pub const MSG_START_RANGING: &str = "Started looking for beacons";
pub const MSG_STOP_RANGING: &str = "Stopped looking for beacons";
pub const MSG_NO_BEACONS: &str = "No beacons detected";
pub const MSG_RADIO_UNSUPPORTED: &str = "This device does not support beacon scanning";
pub const MSG_RADIO_DECLINED: &str = "The radio must be enabled to discover beacons";
pub const MSG_PERMISSION_DENIED: &str =
    "Functionality limited: without location access this app cannot discover beacons";
pub const MSG_ENGINE_FAILURE: &str =
    "The scanning engine is not responding; press start to try again";

// ============================================================================
// EVENTS
// ============================================================================

/// Everything that can happen to the controller, in one enum. Producers are
/// the UI (start/stop), the platform (remediation outcomes), and the engine
/// (via `ChannelListener`).
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// The user asked to start scanning.
    StartRequested,
    /// The user asked to stop scanning.
    StopRequested,
    /// The permission dialog was answered.
    PermissionDecision { granted: bool },
    /// The user came back from the location settings screen.
    LocationSettingsClosed,
    /// The radio-enable prompt was answered.
    RadioEnableDecision { accepted: bool },
    /// The engine finished binding.
    EngineConnected,
    /// The engine process went away.
    EngineConnectionLost,
    /// One scan cycle's observations.
    RangingUpdate(DetectionBatch),
    /// Stop scanning and end the control loop.
    Shutdown,
}

// ============================================================================
// UI SINK
// ============================================================================

/// Presentation surface the controller pushes into. Implementations render
/// however they like; the controller never reads back.
pub trait UiSink: Send + Sync {
    /// Transient, toast-style message.
    fn show_message(&self, message: &str);

    /// Move the proximity indicator.
    fn set_indicator(&self, value: DisplayValue);

    /// Enable or disable the start and stop affordances.
    fn set_affordances(&self, start_enabled: bool, stop_enabled: bool);

    /// Explain why the scanning permission is needed, before the prompt.
    fn show_permission_rationale(&self);

    /// Explain that location settings are about to open.
    fn prompt_location_settings(&self);
}

// ============================================================================
// ENGINE LISTENER
// ============================================================================

/// Forwards engine callbacks into the controller's event channel. Send
/// failures are ignored; they only happen after the control loop has ended.
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl ChannelListener {
    pub fn new(tx: mpsc::UnboundedSender<ControllerEvent>) -> Self {
        Self { tx }
    }
}

impl RangingListener for ChannelListener {
    fn on_connected(&self) {
        let _ = self.tx.send(ControllerEvent::EngineConnected);
    }

    fn on_connection_lost(&self) {
        let _ = self.tx.send(ControllerEvent::EngineConnectionLost);
    }

    fn on_ranging_update(&self, batch: DetectionBatch) {
        let _ = self.tx.send(ControllerEvent::RangingUpdate(batch));
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

pub struct Controller {
    session: ScanSession,
    gate: PreconditionGate,
    platform: Arc<dyn PlatformAdapter>,
    processor: RangingResultProcessor,
    ui: Arc<dyn UiSink>,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl Controller {
    /// Wire a controller from its parts. Validates the configuration and
    /// installs the parser layout on the engine; the engine stays unbound
    /// until the first start request.
    pub fn new(
        config: &ScanConfig,
        engine: Arc<dyn BeaconEngine>,
        platform: Arc<dyn PlatformAdapter>,
        ui: Arc<dyn UiSink>,
        events_tx: mpsc::UnboundedSender<ControllerEvent>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        engine.configure(&config.beacon_layout);

        let filters = config
            .identifier_filters
            .iter()
            .map(Identifier::new)
            .collect();
        let region = Region::new(config.region_name.clone(), filters);
        let session = ScanSession::new(
            engine,
            region,
            Duration::from_millis(config.scan_period_ms),
        );

        Ok(Self {
            session,
            gate: PreconditionGate::new(platform.clone()),
            platform,
            processor: RangingResultProcessor::new(config.indicator_max),
            ui,
            events_tx,
        })
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Consume events until `Shutdown`. The controller holds a sender clone
    /// for its own listener, so the channel never closes on its own; the
    /// loop ends only on the explicit shutdown event.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<ControllerEvent>) {
        while let Some(event) = events.recv().await {
            let shutdown = matches!(event, ControllerEvent::Shutdown);
            self.handle_event(event);
            if shutdown {
                break;
            }
        }
        info!("controller loop ended");
    }

    /// Apply one event to the state machine. Synchronous on purpose: every
    /// transition is a plain function call, testable without a runtime.
    pub fn handle_event(&mut self, event: ControllerEvent) {
        debug!(state = %self.session.state(), ?event, "handling event");
        match event {
            ControllerEvent::StartRequested => self.on_start_requested(),
            ControllerEvent::StopRequested | ControllerEvent::Shutdown => {
                self.on_stop_requested()
            }
            ControllerEvent::PermissionDecision { granted } => {
                self.on_permission_decision(granted)
            }
            ControllerEvent::LocationSettingsClosed => self.on_location_settings_closed(),
            ControllerEvent::RadioEnableDecision { accepted } => {
                self.on_radio_enable_decision(accepted)
            }
            ControllerEvent::EngineConnected => self.on_engine_connected(),
            ControllerEvent::EngineConnectionLost => self.on_connection_lost(),
            ControllerEvent::RangingUpdate(batch) => self.on_ranging_update(batch),
        }
    }

    /// Re-run the precondition gate from scratch. Called on the initial start
    /// request and again after every remediation, so a condition that changed
    /// behind our back is always re-checked and nothing is ever cached.
    fn on_start_requested(&mut self) {
        if self.session.state() != SessionState::Idle {
            info!(state = %self.session.state(), "start ignored, session already in progress");
            return;
        }

        match self.gate.ensure_ready() {
            ReadyOutcome::Ready => self.begin_session(),
            ReadyOutcome::NeedsPermissionPrompt => {
                self.session.await_permission();
                self.ui.show_permission_rationale();
                self.platform.request_permission();
            }
            ReadyOutcome::NeedsLocationSettings => {
                self.session.await_location_service();
                self.ui.prompt_location_settings();
                self.platform.open_location_settings();
            }
            ReadyOutcome::NeedsRadioEnable => {
                self.session.await_radio();
                self.platform.request_radio_enable();
            }
            ReadyOutcome::Unsupported => {
                self.ui.show_message(MSG_RADIO_UNSUPPORTED);
            }
        }
    }

    fn begin_session(&mut self) {
        let listener = Arc::new(ChannelListener::new(self.events_tx.clone()));
        match self.session.start(listener) {
            Ok(true) => self.ui.set_affordances(false, true),
            Ok(false) => {}
            Err(err) => {
                error!(error = %err, "engine bind failed");
                self.ui.show_message(MSG_ENGINE_FAILURE);
            }
        }
    }

    fn on_permission_decision(&mut self, granted: bool) {
        if self.session.state() != SessionState::AwaitingPermission {
            debug!("ignoring stale permission decision");
            return;
        }
        self.session.clear_await();
        if granted {
            self.on_start_requested();
        } else {
            self.ui.show_message(MSG_PERMISSION_DENIED);
        }
    }

    fn on_location_settings_closed(&mut self) {
        if self.session.state() != SessionState::AwaitingLocationService {
            debug!("ignoring stale location settings return");
            return;
        }
        self.session.clear_await();
        // The user may or may not have fixed anything; the gate decides.
        self.on_start_requested();
    }

    fn on_radio_enable_decision(&mut self, accepted: bool) {
        if self.session.state() != SessionState::AwaitingRadio {
            debug!("ignoring stale radio decision");
            return;
        }
        self.session.clear_await();
        if accepted {
            self.on_start_requested();
        } else {
            self.ui.show_message(MSG_RADIO_DECLINED);
        }
    }

    fn on_stop_requested(&mut self) {
        let stopped = self.session.stop();

        // Powering the radio down is a side effect of every stop request,
        // whatever state the session is in.
        if self.platform.radio_state() == RadioState::Enabled {
            self.platform.disable_radio();
        }

        match stopped {
            Ok(false) => debug!("stop with no session in progress"),
            Ok(true) => {
                self.ui.show_message(MSG_STOP_RANGING);
                self.ui.set_affordances(true, false);
            }
            Err(err) => {
                error!(error = %err, "engine failed during teardown");
                self.ui.show_message(MSG_ENGINE_FAILURE);
                self.ui.set_affordances(true, false);
            }
        }
    }

    fn on_engine_connected(&mut self) {
        match self.session.on_engine_connected() {
            Ok(true) => self.ui.show_message(MSG_START_RANGING),
            Ok(false) => {}
            Err(err) => {
                error!(error = %err, "failed to start ranging");
                self.ui.show_message(MSG_ENGINE_FAILURE);
                self.ui.set_affordances(true, false);
            }
        }
    }

    fn on_connection_lost(&mut self) {
        if self.session.on_connection_lost() {
            self.ui.show_message(MSG_ENGINE_FAILURE);
            self.ui.set_affordances(true, false);
        }
    }

    fn on_ranging_update(&mut self, batch: DetectionBatch) {
        if !self.session.is_ranging() {
            debug!(state = %self.session.state(), "dropping batch outside ranging");
            return;
        }
        match self.processor.process(&batch) {
            Some(value) => self.ui.set_indicator(value),
            None => self.ui.show_message(MSG_NO_BEACONS),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
