//! Move-to-next policies: when to leave the current phase.
//!
//! Pure decision objects whose only I/O is a `Sensor` read. The engine
//! binds a fresh policy instance every time it enters a phase and drops
//! it on the next transition, so the only mutable state here is each
//! policy's own timer bookkeeping.

use std::rc::Rc;

use crate::ports::Sensor;

/// Stateful predicate deciding when to leave a phase.
pub trait MoveToNext {
    /// True exactly once the condition for leaving the phase holds.
    fn next(&mut self, now: i64) -> bool;

    /// Seconds remaining until the condition can fire, clamped to ≥ 0.
    /// Used only for reporting.
    fn time_left(&self, now: i64) -> i64;
}

// ---------------------------------------------------------------------------
// By elapsed time
// ---------------------------------------------------------------------------

/// Fires once `duration` seconds have elapsed since `start`.
pub struct ByTime {
    start: i64,
    duration: i64,
}

impl ByTime {
    pub fn new(start: i64, duration: i64) -> Self {
        Self { start, duration }
    }

    /// Restart the countdown from `now`.
    pub fn reset(&mut self, now: i64) {
        self.start = now;
    }
}

impl MoveToNext for ByTime {
    fn next(&mut self, now: i64) -> bool {
        now - self.start >= self.duration
    }

    fn time_left(&self, now: i64) -> i64 {
        (self.start + self.duration - now).max(0)
    }
}

// ---------------------------------------------------------------------------
// By sustained temperature
// ---------------------------------------------------------------------------

/// Fires once the sensor has held at or above `threshold` for `duration`
/// seconds without interruption.
///
/// Two logical states: *armed* (not over threshold) and *waiting* (over
/// threshold, timing the hold via an internal [`ByTime`]). Any dip below
/// the threshold discards the hold timer entirely and re-arms.
pub struct ByTemperature {
    sensor: Rc<dyn Sensor>,
    threshold: f64,
    duration: i64,
    waiting: bool,
    hold: ByTime,
}

impl ByTemperature {
    pub fn new(sensor: Rc<dyn Sensor>, threshold: f64, duration: i64, now: i64) -> Self {
        Self {
            sensor,
            threshold,
            duration,
            waiting: false,
            hold: ByTime::new(now, duration),
        }
    }
}

impl MoveToNext for ByTemperature {
    fn next(&mut self, now: i64) -> bool {
        let over = self.sensor.temperature() >= self.threshold;
        if over != self.waiting {
            self.waiting = over;
            if over {
                // Crossed upward: start timing the hold from this instant.
                self.hold.reset(now);
            } else {
                // Dipped below: the accumulated hold is void.
                return false;
            }
        }
        over && self.hold.next(now)
    }

    fn time_left(&self, now: i64) -> i64 {
        if self.waiting {
            self.hold.time_left(now)
        } else {
            self.duration
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeSensor {
        temperature: Cell<f64>,
    }

    impl FakeSensor {
        fn new(t: f64) -> Rc<Self> {
            Rc::new(Self {
                temperature: Cell::new(t),
            })
        }
    }

    impl Sensor for FakeSensor {
        fn id(&self) -> &str {
            "fake"
        }

        fn temperature(&self) -> f64 {
            self.temperature.get()
        }
    }

    #[test]
    fn by_time_fires_at_duration() {
        let mut n = ByTime::new(0, 100);
        assert!(!n.next(99));
        assert!(n.next(100));
    }

    #[test]
    fn by_time_reset_rebinds_start() {
        let mut n = ByTime::new(0, 100);
        assert!(n.next(100));
        n.reset(100);
        assert!(!n.next(199));
        assert!(n.next(200));
    }

    #[test]
    fn by_time_time_left_clamps_to_zero() {
        let n = ByTime::new(0, 100);
        assert_eq!(n.time_left(30), 70);
        assert_eq!(n.time_left(100), 0);
        assert_eq!(n.time_left(500), 0);
    }

    #[test]
    fn by_temperature_hold_and_re_arm() {
        let sensor = FakeSensor::new(11.0);
        let mut n = ByTemperature::new(sensor.clone(), 30.0, 10, 0);

        // Under threshold: armed, never fires.
        assert!(!n.next(0));

        // Crosses up: starts the hold, does not fire yet.
        sensor.temperature.set(30.1);
        assert!(!n.next(0));

        // Still holding, not long enough.
        assert!(!n.next(9));

        // Dips below: the hold is discarded and the policy re-arms.
        sensor.temperature.set(29.1);
        assert!(!n.next(9));

        // Crosses up again much later: a fresh hold starts from t=100.
        sensor.temperature.set(30.1);
        assert!(!n.next(100));
        assert!(n.next(110));
    }

    #[test]
    fn by_temperature_time_left_resets_when_armed() {
        let sensor = FakeSensor::new(50.0);
        let mut n = ByTemperature::new(sensor.clone(), 30.0, 10, 0);

        assert!(!n.next(0));
        assert_eq!(n.time_left(4), 6);

        // Below threshold: reports the full hold duration again.
        sensor.temperature.set(20.0);
        assert!(!n.next(5));
        assert_eq!(n.time_left(5), 10);
    }

    #[test]
    fn by_temperature_threshold_is_inclusive() {
        let sensor = FakeSensor::new(30.0);
        let mut n = ByTemperature::new(sensor, 30.0, 10, 0);
        assert!(!n.next(0));
        assert!(n.next(10));
    }
}
