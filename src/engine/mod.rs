//! Phase control engine.
//!
//! [`Process`] owns the ordered phase table and orchestrates heaters and
//! outputs each tick:
//!
//! ```text
//!  Clock ──▶ ┌───────────────────────────────┐
//!  Sensor ─▶ │  move-to-next? ─▶ advance     │ ──▶ Heater::set_power
//!            │  hysteresis per GPIO entry    │ ──▶ Output::set
//!            │  assemble Status snapshot     │
//!            └───────────────────────────────┘
//! ```
//!
//! Lifecycle is `Idle → Running(phase 0..N-1) → Done`. The host calls
//! [`Process::run`] once, then [`Process::process`] on every externally
//! scheduled tick; the engine has no ticking thread of its own.
//!
//! ## Concurrency contract
//!
//! The engine is single-threaded: `run`/`process`/`configure`/`set_phases`
//! must be invoked sequentially by one scheduler. No internal locking is
//! applied; wrap the whole `Process` in a mutex if calls can race.

pub mod hysteresis;
pub mod next;

use std::collections::HashMap;
use std::rc::Rc;

use log::{info, warn};

use crate::config::{MoveToNextConfig, PhaseConfig, ProcessConfig};
use crate::error::{ConfigError, Result, StateError};
use crate::ports::{Clock, Heater, Output, Sensor, WallClock};
use crate::status::{
    GpioPhaseStatus, HeaterPhaseStatus, MoveToNextKind, MoveToNextStatus, Status,
    TemperaturePhaseStatus,
};

use next::{ByTemperature, ByTime, MoveToNext};

/// `set_phases` preallocates up to this many slots so repeated small
/// resizes do not churn the allocator.
const PHASE_CAPACITY_FLOOR: usize = 10;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Binds the collaborator set of a [`Process`].
///
/// Heaters, sensors, outputs, and the clock are immutable for the
/// process's lifetime and re-binding requires building a new `Process`.
pub struct ProcessBuilder {
    heaters: HashMap<String, Box<dyn Heater>>,
    sensors: HashMap<String, Rc<dyn Sensor>>,
    outputs: HashMap<String, Box<dyn Output>>,
    clock: Option<Box<dyn Clock>>,
}

impl ProcessBuilder {
    pub fn new() -> Self {
        Self {
            heaters: HashMap::new(),
            sensors: HashMap::new(),
            outputs: HashMap::new(),
            clock: None,
        }
    }

    /// Register a heater under its own ID.
    pub fn heater(mut self, heater: Box<dyn Heater>) -> Self {
        self.heaters.insert(heater.id().to_string(), heater);
        self
    }

    /// Register a sensor under its own ID.
    pub fn sensor(mut self, sensor: Rc<dyn Sensor>) -> Self {
        self.sensors.insert(sensor.id().to_string(), sensor);
        self
    }

    /// Register a digital output under its own ID.
    pub fn output(mut self, output: Box<dyn Output>) -> Self {
        self.outputs.insert(output.id().to_string(), output);
        self
    }

    /// Inject a time source; defaults to [`WallClock`].
    pub fn clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Process {
        Process {
            heaters: self.heaters,
            sensors: self.sensors,
            outputs: self.outputs,
            clock: self.clock.unwrap_or_else(|| Box::new(WallClock)),
            config: ProcessConfig::default(),
            running: false,
            done: false,
            phase: 0,
            start_time: 0,
            end_time: 0,
            next: None,
            next_kind: MoveToNextKind::ByTime,
            gpio_levels: HashMap::new(),
        }
    }
}

impl Default for ProcessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// The phase control engine.
pub struct Process {
    heaters: HashMap<String, Box<dyn Heater>>,
    sensors: HashMap<String, Rc<dyn Sensor>>,
    outputs: HashMap<String, Box<dyn Output>>,
    clock: Box<dyn Clock>,

    config: ProcessConfig,

    running: bool,
    done: bool,
    /// Index of the current phase; stays at the last index once done.
    phase: usize,
    start_time: i64,
    end_time: i64,

    /// Policy bound on phase entry; `None` before the first run and
    /// after completion.
    next: Option<Box<dyn MoveToNext>>,
    next_kind: MoveToNextKind,

    /// Hysteresis memory: last computed (pre-inversion) level per output.
    /// Cleared on every phase entry.
    gpio_levels: HashMap<String, bool>,
}

impl Process {
    pub fn builder() -> ProcessBuilder {
        ProcessBuilder::new()
    }

    // ── Configuration ─────────────────────────────────────────

    /// Validate and atomically replace the whole phase table.
    ///
    /// A rejected config is never partially applied.
    pub fn configure(&mut self, config: ProcessConfig) -> Result<()> {
        self.validate_config(&config)?;
        self.config = config;
        Ok(())
    }

    /// Validate and replace a single phase.
    pub fn configure_phase(&mut self, index: usize, phase: PhaseConfig) -> Result<()> {
        if index >= self.config.phase_number {
            return Err(StateError::NoSuchPhase(index).into());
        }
        self.validate_phase(&phase)?;
        self.config.phases[index] = phase;
        Ok(())
    }

    /// Grow or shrink the phase table to `count` entries.
    ///
    /// Growth preserves existing phases by index and appends empty slots;
    /// shrinking truncates the logical length without reclaiming storage.
    pub fn set_phases(&mut self, count: usize) -> Result<()> {
        if count == 0 {
            return Err(StateError::PhaseCountNotPositive.into());
        }
        if count > self.config.phases.len() {
            let want = count.max(PHASE_CAPACITY_FLOOR);
            if self.config.phases.capacity() < want {
                let len = self.config.phases.len();
                self.config.phases.reserve_exact(want - len);
            }
            self.config.phases.resize_with(count, PhaseConfig::default);
        } else {
            self.config.phases.truncate(count);
        }
        self.config.phase_number = count;
        Ok(())
    }

    /// Read-only view of the current configuration, bounded to
    /// `phase_number` entries.
    pub fn get_config(&self) -> ProcessConfig {
        let mut config = self.config.clone();
        config.phases.truncate(config.phase_number);
        config
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start a run: validate the current config, enter phase 0, and
    /// perform one evaluation pass.
    pub fn run(&mut self) -> Result<Status> {
        if self.running {
            return Err(StateError::AlreadyRunning.into());
        }
        self.validate_config(&self.config)?;

        let now = self.clock.unix();
        self.running = true;
        self.done = false;
        self.start_time = now;
        self.end_time = 0;
        self.enter_phase(0, now);
        info!(
            "run started: {} phases, t={}",
            self.config.phase_number, now
        );

        Ok(self.tick())
    }

    /// Perform one externally scheduled evaluation pass.
    pub fn process(&mut self) -> Result<Status> {
        if !self.running {
            return Err(StateError::NotRunning.into());
        }
        Ok(self.tick())
    }

    // ── Per-tick pass ─────────────────────────────────────────

    fn tick(&mut self) -> Status {
        let now = self.clock.unix();

        let fired = match self.next.as_mut() {
            Some(policy) => policy.next(now),
            None => false,
        };
        if fired {
            let upcoming = self.phase + 1;
            if upcoming >= self.config.phase_number {
                self.finish(now);
            } else {
                self.enter_phase(upcoming, now);
            }
        }

        let mut errors = Vec::new();
        let heaters = self.push_heaters(&mut errors);
        let gpio = self.push_gpio(&mut errors);
        let temperature = self.read_temperatures();

        let time_left = match self.next.as_ref() {
            Some(policy) => policy.time_left(now),
            None => 0,
        };

        Status {
            running: self.running,
            done: self.done,
            phase_number: self.phase,
            start_time: self.start_time,
            end_time: self.end_time,
            next: MoveToNextStatus {
                kind: self.next_kind,
                time_left,
            },
            heaters,
            temperature,
            gpio,
            errors,
        }
    }

    /// Bind a fresh move-to-next policy and clear hysteresis memory.
    fn enter_phase(&mut self, index: usize, now: i64) {
        info!("entering phase {index}");
        let policy: Box<dyn MoveToNext> = match &self.config.phases[index].next {
            MoveToNextConfig::ByTime { seconds } => {
                self.next_kind = MoveToNextKind::ByTime;
                Box::new(ByTime::new(now, *seconds))
            }
            MoveToNextConfig::ByTemperature {
                sensor_id,
                threshold,
                hold_seconds,
            } => {
                self.next_kind = MoveToNextKind::ByTemperature;
                match self.sensors.get(sensor_id) {
                    Some(sensor) => Box::new(ByTemperature::new(
                        Rc::clone(sensor),
                        *threshold,
                        *hold_seconds,
                        now,
                    )),
                    None => {
                        // Only reachable through unvalidated mid-run
                        // reconfiguration; fall back to timing the hold.
                        warn!("phase {index}: sensor {sensor_id} vanished, timing hold instead");
                        Box::new(ByTime::new(now, *hold_seconds))
                    }
                }
            }
        };
        self.next = Some(policy);
        self.phase = index;
        self.gpio_levels.clear();
    }

    fn finish(&mut self, now: i64) {
        self.running = false;
        self.done = true;
        self.end_time = now;
        self.next = None;
        info!("run done after {} s", now - self.start_time);
    }

    /// Push the current phase's power setpoints; once done, park every
    /// registered heater at 0 %.
    fn push_heaters(&mut self, errors: &mut Vec<String>) -> Vec<HeaterPhaseStatus> {
        let mut status = Vec::new();

        if self.done {
            for (id, heater) in &mut self.heaters {
                if let Err(e) = heater.set_power(0) {
                    let msg = format!("heater {id}: {e:#}");
                    warn!("{msg}");
                    errors.push(msg);
                }
                status.push(HeaterPhaseStatus {
                    id: id.clone(),
                    power: 0,
                });
            }
            return status;
        }

        let Some(phase) = self.config.phases.get(self.phase) else {
            return status;
        };
        for setpoint in &phase.heaters {
            match self.heaters.get_mut(&setpoint.id) {
                Some(heater) => {
                    if let Err(e) = heater.set_power(setpoint.power) {
                        let msg = format!("heater {}: {e:#}", setpoint.id);
                        warn!("{msg}");
                        errors.push(msg);
                    }
                    status.push(HeaterPhaseStatus {
                        id: setpoint.id.clone(),
                        power: setpoint.power,
                    });
                }
                None => errors.push(format!("heater {} not registered", setpoint.id)),
            }
        }
        status
    }

    /// Evaluate hysteresis for each GPIO entry of the current phase and
    /// push the (possibly inverted) level; once done, park every entry
    /// of the final phase at its inactive level.
    fn push_gpio(&mut self, errors: &mut Vec<String>) -> Vec<GpioPhaseStatus> {
        let mut status = Vec::new();
        let Some(phase) = self.config.phases.get(self.phase) else {
            return status;
        };

        for entry in &phase.gpio {
            let level = if self.done {
                false
            } else {
                let Some(sensor) = self.sensors.get(&entry.sensor_id) else {
                    errors.push(format!("sensor {} not registered", entry.sensor_id));
                    continue;
                };
                let last = self.gpio_levels.get(&entry.id).copied().unwrap_or(false);
                let level =
                    hysteresis::evaluate(last, sensor.temperature(), entry.t_low, entry.hysteresis);
                self.gpio_levels.insert(entry.id.clone(), level);
                level
            };

            let written = level != entry.inverted;
            match self.outputs.get_mut(&entry.id) {
                Some(output) => {
                    if let Err(e) = output.set(written) {
                        let msg = format!("output {}: {e:#}", entry.id);
                        warn!("{msg}");
                        errors.push(msg);
                    }
                }
                None => errors.push(format!("output {} not registered", entry.id)),
            }
            status.push(GpioPhaseStatus {
                id: entry.id.clone(),
                state: written,
            });
        }
        status
    }

    fn read_temperatures(&self) -> Vec<TemperaturePhaseStatus> {
        self.sensors
            .iter()
            .map(|(id, sensor)| TemperaturePhaseStatus {
                id: id.clone(),
                temperature: sensor.temperature(),
            })
            .collect()
    }

    // ── Validation ────────────────────────────────────────────

    fn validate_config(&self, config: &ProcessConfig) -> Result<()> {
        if config.phase_number == 0 {
            return Err(ConfigError::NoPhases.into());
        }
        if config.phases.len() != config.phase_number {
            return Err(ConfigError::PhaseCountMismatch {
                want: config.phase_number,
                got: config.phases.len(),
            }
            .into());
        }
        for phase in &config.phases {
            self.validate_phase(phase)?;
        }
        Ok(())
    }

    fn validate_phase(&self, phase: &PhaseConfig) -> Result<()> {
        // Every registered heater needs an explicit setpoint.
        if phase.heaters.len() != self.heaters.len() {
            return Err(ConfigError::HeaterConfigCount {
                want: self.heaters.len(),
                got: phase.heaters.len(),
            }
            .into());
        }
        for setpoint in &phase.heaters {
            if !self.heaters.contains_key(&setpoint.id) {
                return Err(ConfigError::UnknownHeater(setpoint.id.clone()).into());
            }
            if setpoint.power > 100 {
                return Err(ConfigError::PowerOutOfRange {
                    id: setpoint.id.clone(),
                    power: setpoint.power,
                }
                .into());
            }
        }

        match &phase.next {
            MoveToNextConfig::ByTime { seconds } => {
                if *seconds <= 0 {
                    return Err(ConfigError::SecondsToMoveNotPositive.into());
                }
            }
            MoveToNextConfig::ByTemperature { sensor_id, .. } => {
                if !self.sensors.contains_key(sensor_id) {
                    return Err(ConfigError::UnknownSensor(sensor_id.clone()).into());
                }
            }
        }

        if !self.outputs.is_empty() && phase.gpio.len() != self.outputs.len() {
            return Err(ConfigError::GpioConfigCount {
                want: self.outputs.len(),
                got: phase.gpio.len(),
            }
            .into());
        }
        for entry in &phase.gpio {
            if !self.outputs.contains_key(&entry.id) {
                return Err(ConfigError::UnknownOutput(entry.id.clone()).into());
            }
            if !self.sensors.contains_key(&entry.sensor_id) {
                return Err(ConfigError::UnknownSensor(entry.sensor_id.clone()).into());
            }
        }
        Ok(())
    }
}
