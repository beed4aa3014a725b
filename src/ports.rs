//! Capability traits: the boundary between the engine and the hardware.
//!
//! ```text
//!   Sensor ──▶ ┌──────────────────────┐ ──▶ Heater
//!    Clock ──▶ │   Process (engine)    │ ──▶ Output
//!              └──────────────────────┘
//! ```
//!
//! Driver adapters (1-Wire / SPI temperature polling layers, GPIO line
//! wrappers, the duty-cycle actuator in [`crate::heater`]) implement these
//! traits. The engine consumes them through trait objects keyed by their
//! stable IDs, so the domain core never touches hardware directly.
//!
//! The engine is single-threaded by contract (one external scheduler calls
//! it), so sensors are shared as `Rc` handles and none of these traits
//! require `Send`.

use std::time::{SystemTime, UNIX_EPOCH};

/// Read-side capability: a temperature probe with a stable ID.
///
/// Never invoked concurrently with itself by the engine.
pub trait Sensor {
    fn id(&self) -> &str;

    /// Current temperature in °C.
    fn temperature(&self) -> f64;
}

/// A digital output line (valve, pump relay, alarm) with a stable ID.
pub trait Output {
    fn id(&self) -> &str;

    /// Drive the line to the given level.
    fn set(&mut self, level: bool) -> anyhow::Result<()>;
}

/// A heater accepting a 0–100 power percentage.
///
/// Backed by the duty-cycle actuator in [`crate::heater`] or a mock.
pub trait Heater {
    fn id(&self) -> &str;

    /// Apply a power setpoint in percent.
    fn set_power(&mut self, pct: u8) -> anyhow::Result<()>;
}

/// Time source for phase timing, as Unix seconds.
pub trait Clock {
    fn unix(&self) -> i64;
}

/// Default [`Clock`] backed by the system wall clock.
///
/// Used when no clock is injected into the engine builder; tests inject
/// a fake instead.
pub struct WallClock;

impl Clock for WallClock {
    fn unix(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            // Pre-epoch system clock; report the epoch itself.
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_is_past_2020() {
        const EPOCH_2020: i64 = 1_577_836_800;
        assert!(WallClock.unix() > EPOCH_2020);
    }
}
