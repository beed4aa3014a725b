//! Unified error types for the stillpilot engine.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! host's error handling uniform. Configuration and state errors are
//! returned synchronously and never leave partial state behind; actuator
//! push failures are *not* represented here; they are collected as
//! strings in `Status::errors` and the control loop continues.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

/// Every fallible engine operation funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A configuration failed validation and was rejected wholesale.
    Config(ConfigError),
    /// `run`/`process` was called in the wrong lifecycle state.
    State(StateError),
    /// A heater actuator rejected a command.
    Heater(HeaterError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::State(e) => write!(f, "state: {e}"),
            Self::Heater(e) => write!(f, "heater: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Phase-table validation failures.
///
/// Checked in a fixed order per phase: heater count and IDs/power range,
/// then the move-to-next rule, then GPIO count and cross-references.
/// The first failure wins and the prior configuration stays in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The phase table is empty, nothing to run.
    NoPhases,
    /// `phases.len()` does not match the declared phase number.
    PhaseCountMismatch { want: usize, got: usize },
    /// A phase does not carry a setpoint for every registered heater.
    HeaterConfigCount { want: usize, got: usize },
    /// A heater setpoint references an unregistered heater ID.
    UnknownHeater(String),
    /// A heater setpoint is above 100 %.
    PowerOutOfRange { id: String, power: u8 },
    /// A by-time move-to-next rule with a non-positive duration.
    SecondsToMoveNotPositive,
    /// A config entry references an unregistered sensor ID.
    UnknownSensor(String),
    /// A phase does not carry an entry for every registered output.
    GpioConfigCount { want: usize, got: usize },
    /// A GPIO entry references an unregistered output ID.
    UnknownOutput(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPhases => write!(f, "no phases configured"),
            Self::PhaseCountMismatch { want, got } => {
                write!(f, "phase count differs: declared {want}, got {got}")
            }
            Self::HeaterConfigCount { want, got } => {
                write!(f, "heater config count differs: registered {want}, got {got}")
            }
            Self::UnknownHeater(id) => write!(f, "unknown heater: {id}"),
            Self::PowerOutOfRange { id, power } => {
                write!(f, "power out of range for {id}: {power}")
            }
            Self::SecondsToMoveNotPositive => write!(f, "seconds to move must be positive"),
            Self::UnknownSensor(id) => write!(f, "unknown sensor: {id}"),
            Self::GpioConfigCount { want, got } => {
                write!(f, "gpio config count differs: registered {want}, got {got}")
            }
            Self::UnknownOutput(id) => write!(f, "unknown output: {id}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Lifecycle state errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// `run` called while a run is in progress.
    AlreadyRunning,
    /// `process` called before `run` or after the run finished.
    NotRunning,
    /// `configure_phase` addressed an index past the phase table.
    NoSuchPhase(usize),
    /// `set_phases` called with zero phases.
    PhaseCountNotPositive,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "already running"),
            Self::NotRunning => write!(f, "not running"),
            Self::NoSuchPhase(idx) => write!(f, "no such phase: {idx}"),
            Self::PhaseCountNotPositive => write!(f, "phase count must be positive"),
        }
    }
}

impl std::error::Error for StateError {}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Self::State(e)
    }
}

// ---------------------------------------------------------------------------
// Heater actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterError {
    /// Requested duty percentage above 100.
    PowerOutOfRange(u8),
}

impl fmt::Display for HeaterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerOutOfRange(pct) => write!(f, "power out of range: {pct}"),
        }
    }
}

impl std::error::Error for HeaterError {}

impl From<HeaterError> for Error {
    fn from(e: HeaterError) -> Self {
        Self::Heater(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Engine-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
