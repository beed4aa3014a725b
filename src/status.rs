//! Per-tick status snapshot.
//!
//! Rebuilt fresh on every `run`/`process` call from current collaborator
//! readings, never mutated in place between ticks. The transport layer
//! maps it 1:1 to its wire format.
//!
//! Heater, temperature, and GPIO entries come from ID-keyed maps, so
//! their order is unspecified; consumers (and tests) must compare them
//! as sets.

use serde::{Deserialize, Serialize};

/// Snapshot of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// A run is in progress.
    pub running: bool,
    /// The run finished by advancing past the last phase.
    pub done: bool,
    /// Index of the current phase (the last phase once `done`).
    pub phase_number: usize,
    /// Unix seconds at which `run` was called.
    pub start_time: i64,
    /// Unix seconds at which the run finished; 0 while in progress.
    pub end_time: i64,
    /// Advance condition of the current phase.
    pub next: MoveToNextStatus,
    /// Power actually pushed to each configured heater this tick.
    pub heaters: Vec<HeaterPhaseStatus>,
    /// Current reading of every registered sensor.
    pub temperature: Vec<TemperaturePhaseStatus>,
    /// Level written to each configured output this tick.
    pub gpio: Vec<GpioPhaseStatus>,
    /// Non-fatal actuator push failures from this tick.
    pub errors: Vec<String>,
}

/// Reporting view of the active move-to-next policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveToNextStatus {
    pub kind: MoveToNextKind,
    /// Seconds remaining until the condition can fire, clamped to ≥ 0.
    /// For a by-temperature policy that is not currently over threshold
    /// this reports the full hold duration.
    pub time_left: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveToNextKind {
    ByTime,
    ByTemperature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaterPhaseStatus {
    pub id: String,
    pub power: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePhaseStatus {
    pub id: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioPhaseStatus {
    pub id: String,
    /// The level actually written, i.e. after `inverted` is applied.
    pub state: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let s = Status {
            running: true,
            done: false,
            phase_number: 1,
            start_time: 1_700_000_000,
            end_time: 0,
            next: MoveToNextStatus {
                kind: MoveToNextKind::ByTemperature,
                time_left: 42,
            },
            heaters: vec![HeaterPhaseStatus {
                id: "boiler".into(),
                power: 40,
            }],
            temperature: vec![TemperaturePhaseStatus {
                id: "head".into(),
                temperature: 78.4,
            }],
            gpio: vec![GpioPhaseStatus {
                id: "cooling_valve".into(),
                state: true,
            }],
            errors: vec![],
        };
        let json = serde_json::to_string(&s).unwrap();
        let s2: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(s, s2);
    }
}
