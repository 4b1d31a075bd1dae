// ── Synthetic system status ──
//
// The dashboard shows memory and network figures that are randomly
// sampled, not measured. They are placeholders for real telemetry.

use chrono::{DateTime, Local};
use rand::Rng;
use serde::Serialize;

/// Clock format used in the status bar.
pub const CLOCK_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// One status-bar sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemStatus {
    pub clock: DateTime<Local>,
    /// Synthetic, in `[20, 50)`.
    pub memory_pct: u8,
    /// Synthetic, in `[1.0, 11.0)`, one decimal place.
    pub network_mbps: f64,
}

impl SystemStatus {
    pub fn sample() -> Self {
        Self::sample_with(&mut rand::rng(), Local::now())
    }

    pub fn sample_with<R: Rng + ?Sized>(rng: &mut R, clock: DateTime<Local>) -> Self {
        let memory_pct = rng.random_range(20..50);
        let tenths: u8 = rng.random_range(10..110);
        Self {
            clock,
            memory_pct,
            network_mbps: f64::from(tenths) / 10.0,
        }
    }

    pub fn clock_text(&self) -> String {
        self.clock.format(CLOCK_FORMAT).to_string()
    }
}
