//! Tick source for the duty-cycle worker.
//!
//! The worker consumes ticks from a plain `mpsc` channel, so the real
//! ticker is just a sleeper thread feeding one sender. A stopped ticker
//! drops its sender, which is how the worker learns the cycle is over;
//! there is no separate stop signal on the worker side.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Periodic tick emitter.
///
/// `start` must not be called again without an intervening `stop`; the
/// owning heater's enable flag guarantees that.
pub trait Ticker {
    /// Begin emitting a tick every `interval` into `ticks` until stopped.
    fn start(&mut self, interval: Duration, ticks: mpsc::Sender<Instant>);

    /// Stop emitting and release the sender. Blocks until no further
    /// tick can be delivered (at most one interval).
    fn stop(&mut self);
}

/// Real [`Ticker`]: a dedicated sleeper thread.
///
/// Sleep-based timing drifts by the loop overhead per tick, which is
/// well inside the tolerance of a ~1 s duty-cycle window.
pub struct SystemTicker {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SystemTicker {
    pub fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl Default for SystemTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for SystemTicker {
    fn start(&mut self, interval: Duration, ticks: mpsc::Sender<Instant>) {
        // Fresh flag per start so a previous cycle's thread, if any,
        // cannot observe this one's stop.
        let stop = Arc::new(AtomicBool::new(false));
        self.stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("ticker".into())
            .spawn(move || {
                loop {
                    thread::sleep(interval);
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    if ticks.send(Instant::now()).is_err() {
                        break;
                    }
                }
            })
            .expect("ticker thread spawn");
        self.worker = Some(handle);
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SystemTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_ticks_until_stopped() {
        let mut ticker = SystemTicker::new();
        let (tx, rx) = mpsc::channel();
        ticker.start(Duration::from_millis(1), tx);

        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(1))
                .expect("tick within a second");
        }

        ticker.stop();
        // The sender is gone once stop returns; the channel drains dry.
        while rx.try_recv().is_ok() {}
        assert!(rx.recv().is_err());
    }

    #[test]
    fn stop_without_start_is_a_no_op() {
        let mut ticker = SystemTicker::new();
        ticker.stop();
    }
}
