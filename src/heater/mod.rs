//! Heater duty-cycle actuator: software PWM over a boolean drive.
//!
//! Converts a 0–100 power percentage into a time-sliced on/off signal:
//! a worker thread advances a 0–99 counter on every ticker tick and
//! holds the drive on for the first `power` slots of each 100-tick
//! window (~1 s period at the 10 ms tick).
//!
//! ```text
//!  set_power(40)          ┌────────┐          ┌────────┐
//!  ────────────▶  drive:  │  on 40 │ off 60   │  on 40 │ off 60  …
//!                         └────────┴──────────┴────────┴───────
//! ```
//!
//! This is the only genuinely concurrent sub-system around the engine:
//! exactly one worker thread per enabled heater. `enable(true)` blocks
//! until the worker has genuinely started; `enable(false)` blocks until
//! it has driven the output off and terminated. Set failures during
//! steady-state cycling are reported on a bounded best-effort channel
//! and never stop the cycle.

pub mod ticker;

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};

use crate::error::HeaterError;
use crate::ports::Heater;

use ticker::Ticker;

/// Tick interval of the duty cycle: 100 ticks ≈ 1 s period.
const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Capacity of the best-effort diagnostic channel; overflow is dropped.
const ERROR_BUFFER: usize = 100;

/// The boolean drive behind a heater (SSR, relay line).
///
/// Implementations must be `Send`: the drive moves into the worker
/// thread while the cycle runs and comes back on disable.
pub trait Heating: Send {
    /// Claim the underlying line. Failing here is fatal for [`DutyCycle::new`].
    fn open(&mut self) -> anyhow::Result<()>;

    /// Drive the line on or off.
    fn set(&mut self, on: bool) -> anyhow::Result<()>;
}

/// Software-PWM heater actuator.
pub struct DutyCycle {
    id: String,
    /// Shared with the worker; updated live, applied on the next tick.
    power: Arc<AtomicU8>,
    enabled: bool,
    ticker: Box<dyn Ticker>,
    /// Present while disabled; `None` while the worker holds it.
    drive: Option<Box<dyn Heating>>,
    worker: Option<JoinHandle<Box<dyn Heating>>>,
    err_tx: SyncSender<String>,
    err_rx: Receiver<String>,
}

impl DutyCycle {
    /// Claim the drive and build a disabled actuator at 0 % power.
    pub fn new(
        id: impl Into<String>,
        mut drive: Box<dyn Heating>,
        ticker: Box<dyn Ticker>,
    ) -> anyhow::Result<Self> {
        drive.open()?;
        let (err_tx, err_rx) = mpsc::sync_channel(ERROR_BUFFER);
        Ok(Self {
            id: id.into(),
            power: Arc::new(AtomicU8::new(0)),
            enabled: false,
            ticker,
            drive: Some(drive),
            worker: None,
            err_tx,
            err_rx,
        })
    }

    /// Store the target duty percentage; takes effect on the next tick,
    /// no restart required.
    pub fn set_power(&self, pct: u8) -> Result<(), HeaterError> {
        if pct > 100 {
            return Err(HeaterError::PowerOutOfRange(pct));
        }
        self.power.store(pct, Ordering::Relaxed);
        Ok(())
    }

    /// Current target duty percentage.
    pub fn power(&self) -> u8 {
        self.power.load(Ordering::Relaxed)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Drain one pending worker diagnostic, oldest first.
    pub fn take_error(&self) -> Option<String> {
        self.err_rx.try_recv().ok()
    }

    /// Start or stop the duty cycle. Idempotent: repeating the current
    /// state is a no-op.
    ///
    /// Disabling blocks until the worker has forced the drive off and
    /// terminated; callers may assume the output is physically off once
    /// this returns.
    pub fn enable(&mut self, on: bool) {
        if on == self.enabled {
            return;
        }
        if on {
            if !self.spawn_worker() {
                return;
            }
            info!("heater {}: enabled", self.id);
        } else {
            self.shutdown_worker();
            info!("heater {}: disabled", self.id);
        }
        self.enabled = on;
    }

    fn spawn_worker(&mut self) -> bool {
        // The drive is only absent if a previous worker panicked with it.
        let Some(mut drive) = self.drive.take() else {
            warn!("heater {}: drive lost, cannot enable", self.id);
            return false;
        };

        let (tick_tx, tick_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<()>(0);
        let power = Arc::clone(&self.power);
        let err_tx = self.err_tx.clone();

        let handle = thread::Builder::new()
            .name(format!("heater-{}", self.id))
            .spawn(move || {
                let _ = ready_tx.send(());
                let mut counter: u8 = 0;
                while tick_rx.recv().is_ok() {
                    let on = counter < power.load(Ordering::Relaxed);
                    if let Err(e) = drive.set(on) {
                        let _ = err_tx.try_send(format!("set: {e:#}"));
                    }
                    counter = (counter + 1) % 100;
                }
                // Ticker gone: force the drive off exactly once on exit.
                if let Err(e) = drive.set(false) {
                    let _ = err_tx.try_send(format!("shutdown set: {e:#}"));
                }
                drive
            })
            .expect("heater worker spawn");

        self.ticker.start(TICK_INTERVAL, tick_tx);
        // Rendezvous: do not return before the worker is actually up.
        let _ = ready_rx.recv();
        self.worker = Some(handle);
        true
    }

    fn shutdown_worker(&mut self) {
        // Stopping the ticker drops the tick sender; the worker drains
        // whatever is queued, drives the output off, and exits.
        self.ticker.stop();
        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(drive) => self.drive = Some(drive),
                Err(_) => warn!("heater {}: worker panicked, drive lost", self.id),
            }
        }
    }
}

impl Drop for DutyCycle {
    fn drop(&mut self) {
        if self.enabled {
            self.shutdown_worker();
        }
    }
}

impl Heater for DutyCycle {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_power(&mut self, pct: u8) -> anyhow::Result<()> {
        DutyCycle::set_power(self, pct)?;
        Ok(())
    }
}
