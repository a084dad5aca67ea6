// beaconwatch — Beacon detection from the terminal
//
// Drives the detection controller against a simulated scanning engine, with
// platform prompts answered by a scriptable fake user.

mod config;
mod platform;
mod ui;

use anyhow::{Context, Result};
use beaconwatch_core::{
    Controller, ControllerEvent, PreconditionGate, RadioState, ReadyOutcome, SimulatedBeacon,
    SimulatedEngine, SimulationConfig,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use platform::{PlatformScript, ScriptedPlatform};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use ui::TerminalUi;

#[derive(Parser)]
#[command(name = "beaconwatch")]
#[command(about = "Beaconwatch — Beacon detection controller", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for beacons with the simulated engine
    Scan {
        /// Scan cycle duration in milliseconds
        #[arg(short, long)]
        period_ms: Option<u64>,
        /// How long to scan before stopping
        #[arg(short, long, default_value = "10")]
        duration_secs: u64,
        /// Number of simulated beacons
        #[arg(short, long)]
        beacons: Option<usize>,
        #[command(flatten)]
        script: ScriptArgs,
    },
    /// Check scan preconditions without starting a scan
    Check {
        #[command(flatten)]
        script: ScriptArgs,
    },
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
    List,
}

/// Flags describing the initial platform state and how the scripted user
/// answers each remediation prompt.
#[derive(Args)]
struct ScriptArgs {
    /// Start without the scanning permission granted
    #[arg(long)]
    no_permission: bool,
    /// Answer the permission prompt with a denial
    #[arg(long)]
    deny_permission: bool,
    /// Start with every location provider disabled
    #[arg(long)]
    location_off: bool,
    /// Enable location when the settings screen opens
    #[arg(long)]
    fix_location: bool,
    /// Initial radio adapter state
    #[arg(long, value_enum, default_value_t = RadioArg::Enabled)]
    radio: RadioArg,
    /// Answer the radio-enable prompt with an acceptance (the default)
    #[arg(long, conflicts_with = "decline_radio_enable")]
    accept_radio_enable: bool,
    /// Answer the radio-enable prompt with a decline
    #[arg(long)]
    decline_radio_enable: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum RadioArg {
    Absent,
    Disabled,
    Enabled,
}

impl From<RadioArg> for RadioState {
    fn from(arg: RadioArg) -> Self {
        match arg {
            RadioArg::Absent => RadioState::Absent,
            RadioArg::Disabled => RadioState::Disabled,
            RadioArg::Enabled => RadioState::Enabled,
        }
    }
}

impl ScriptArgs {
    fn to_script(&self) -> PlatformScript {
        PlatformScript {
            permission_granted: !self.no_permission,
            grant_on_request: !self.deny_permission,
            location_enabled: !self.location_off,
            fix_location_on_open: self.fix_location,
            radio: self.radio.into(),
            accept_radio_enable: !self.decline_radio_enable,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            period_ms,
            duration_secs,
            beacons,
            script,
        } => cmd_scan(period_ms, duration_secs, beacons, script).await,
        Commands::Check { script } => cmd_check(script),
        Commands::Config { action } => cmd_config(action),
    }
}

async fn cmd_scan(
    period_ms: Option<u64>,
    duration_secs: u64,
    beacons: Option<usize>,
    script: ScriptArgs,
) -> Result<()> {
    let mut file_config = config::Config::load()?;
    if let Some(period) = period_ms {
        file_config.scan_period_ms = period;
    }
    let beacon_count = beacons.unwrap_or(file_config.simulated_beacons);
    let scan_config = file_config.scan_config();

    let (tx, rx) = mpsc::unbounded_channel();
    let engine = Arc::new(SimulatedEngine::new(simulation(beacon_count)));
    let platform = Arc::new(ScriptedPlatform::new(script.to_script(), tx.clone()));
    let ui = Arc::new(TerminalUi::new(scan_config.indicator_max));

    let controller = Controller::new(&scan_config, engine, platform, ui, tx.clone())
        .context("Failed to build controller")?;
    let control_loop = tokio::spawn(controller.run(rx));

    println!(
        "{}",
        format!(
            "Scanning region '{}' with {} simulated beacon(s) for {}s (Ctrl-C to stop early)",
            scan_config.region_name, beacon_count, duration_secs
        )
        .cyan()
    );
    tx.send(ControllerEvent::StartRequested)?;

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(duration_secs)) => {}
        _ = tokio::signal::ctrl_c() => {
            println!();
        }
    }

    tx.send(ControllerEvent::StopRequested)?;
    tx.send(ControllerEvent::Shutdown)?;
    control_loop.await.context("Controller task failed")?;
    Ok(())
}

fn cmd_check(script: ScriptArgs) -> Result<()> {
    // The gate only reads state; no control loop needed here.
    let (tx, _rx) = mpsc::unbounded_channel();
    let platform = Arc::new(ScriptedPlatform::new(script.to_script(), tx));
    let gate = PreconditionGate::new(platform);

    match gate.ensure_ready() {
        ReadyOutcome::Ready => {
            println!("{}", "✓ Ready to scan".green());
        }
        ReadyOutcome::NeedsPermissionPrompt => {
            println!("{}", "✗ Scanning permission not granted".red());
        }
        ReadyOutcome::NeedsLocationSettings => {
            println!("{}", "✗ No location provider enabled".red());
        }
        ReadyOutcome::NeedsRadioEnable => {
            println!("{}", "✗ Radio adapter is disabled".red());
        }
        ReadyOutcome::Unsupported => {
            println!("{}", "✗ No radio adapter on this device".red());
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            let mut cfg = config::Config::load()?;
            cfg.set(&key, &value)?;
            println!("{} {} = {}", "Set".green(), key, value);
        }
        ConfigAction::Get { key } => match config::Config::load()?.get(&key) {
            Some(value) => println!("{} = {}", key, value),
            None => println!("{} Unknown config key: {}", "Error:".red(), key),
        },
        ConfigAction::List => {
            println!("{}", "Configuration:".bold());
            for (key, value) in config::Config::load()?.list() {
                println!("  {} = {}", key.cyan(), value);
            }
        }
    }
    Ok(())
}

/// Beacons spread out from the listener at 1.5 m intervals, drifting a little
/// each cycle and occasionally missing one.
fn simulation(beacon_count: usize) -> SimulationConfig {
    let beacons = (0..beacon_count.max(1))
        .map(|i| SimulatedBeacon {
            identifiers: vec![
                "2f234454-cf6d-4a0f-adf2-f4911ba9ffa6".to_string(),
                "1".to_string(),
                (i + 1).to_string(),
            ],
            base_distance_m: 1.0 + i as f64 * 1.5,
            wander_m: 0.4,
        })
        .collect();
    SimulationConfig {
        beacons,
        dropout_rate: 0.1,
    }
}
