// Terminal presentation for the Beaconwatch CLI
//
// Messages print as colored lines; the proximity indicator renders as a bar
// redrawn in place on the current line.

use beaconwatch_core::{DisplayValue, UiSink};
use colored::*;
use std::io::Write;
use tracing::debug;

const BAR_WIDTH: usize = 40;

pub struct TerminalUi {
    indicator_max: u32,
    bar_width: usize,
}

impl TerminalUi {
    pub fn new(indicator_max: u32) -> Self {
        Self {
            indicator_max,
            bar_width: BAR_WIDTH,
        }
    }

    fn render_bar(&self, value: u32) -> String {
        let ratio = f64::from(value) / f64::from(self.indicator_max.max(1));
        let filled = ((ratio * self.bar_width as f64).round() as usize).min(self.bar_width);
        format!(
            "[{}{}] {:>6} mm",
            "#".repeat(filled),
            "-".repeat(self.bar_width - filled),
            value
        )
    }
}

impl UiSink for TerminalUi {
    fn show_message(&self, message: &str) {
        println!("{}", message.yellow());
    }

    fn set_indicator(&self, value: DisplayValue) {
        print!("\r{}", self.render_bar(value.value()).green());
        let _ = std::io::stdout().flush();
    }

    fn set_affordances(&self, start_enabled: bool, stop_enabled: bool) {
        // No buttons on a terminal; only worth a trace.
        debug!(start_enabled, stop_enabled, "affordances changed");
    }

    fn show_permission_rationale(&self) {
        println!(
            "{}",
            "This app needs location access to discover beacons around you".cyan()
        );
    }

    fn prompt_location_settings(&self) {
        println!(
            "{}",
            "Location services are off; opening location settings".cyan()
        );
    }
}
