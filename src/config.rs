//! Run configuration: the ordered phase table.
//!
//! All tunable parameters for one unattended distillation run. The host's
//! transport layer maps these types 1:1 to its wire format; validation
//! happens in [`crate::engine::Process`], not here, because the rules
//! depend on which capabilities are registered.

use serde::{Deserialize, Serialize};

/// Full configuration of a run: a fixed number of ordered phases.
///
/// Invariant at every observable boundary: `phases.len() == phase_number`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Declared number of phases.
    pub phase_number: usize,
    /// Per-phase setpoints and advance conditions, in execution order.
    pub phases: Vec<PhaseConfig>,
}

/// One stage of the run: heater setpoints, output control, and the
/// condition for moving on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// When to leave this phase.
    pub next: MoveToNextConfig,
    /// Power setpoint for every registered heater; partial lists are
    /// rejected at validation.
    pub heaters: Vec<HeaterPhaseConfig>,
    /// Hysteresis drive for every registered output.
    pub gpio: Vec<GpioPhaseConfig>,
}

/// Phase-advance condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveToNextConfig {
    /// Advance after a fixed number of elapsed seconds (must be > 0).
    ByTime { seconds: i64 },
    /// Advance once the named sensor has held at or above `threshold`
    /// for `hold_seconds` without dipping below.
    ByTemperature {
        sensor_id: String,
        threshold: f64,
        hold_seconds: i64,
    },
}

impl Default for MoveToNextConfig {
    fn default() -> Self {
        // An empty phase slot; rejected by validation until configured.
        Self::ByTime { seconds: 0 }
    }
}

/// Power setpoint for one heater within one phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaterPhaseConfig {
    pub id: String,
    /// Duty percentage, 0–100.
    pub power: u8,
}

/// Drives one output from one sensor reading with two-point hysteresis.
///
/// The output turns on once the temperature reaches `t_low` and stays on
/// until it drops below `t_low - hysteresis`. `inverted` flips the level
/// at the write. `t_high` is carried and validated but currently has no
/// effect on the algorithm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpioPhaseConfig {
    pub id: String,
    pub sensor_id: String,
    pub t_low: f64,
    pub t_high: f64,
    pub hysteresis: f64,
    pub inverted: bool,
}
