//! Two-point hysteresis for GPIO drive levels.
//!
//! Bang-bang control with a dead band below the on-threshold, preventing
//! rapid toggling near the setpoint:
//!
//! ```text
//!        off ──▶ on   at  t >= t_low
//!        on  ──▶ off  at  t <  t_low - hysteresis
//! ```
//!
//! The caller keeps the last computed level per output across ticks so
//! the band has memory; the engine resets that memory on phase entry.
//! Inversion is applied by the engine at the write, not here.

/// Compute the next drive level from the last one and a fresh reading.
pub fn evaluate(last: bool, temperature: f64, t_low: f64, hysteresis: f64) -> bool {
    if last {
        temperature >= t_low - hysteresis
    } else {
        temperature >= t_low
    }
}
