//! Stillpilot, an unattended distillation run controller.
//!
//! The crate is the phase control core behind a thin REST/RPC/CLI host:
//! the host translates wire formats into calls on [`engine::Process`]
//! and forwards an externally scheduled tick. Hardware is reached only
//! through the capability traits in [`ports`]; the one concurrent piece
//! is the heater duty-cycle actuator in [`heater`].

#![deny(unused_must_use)]

pub mod config;
pub mod engine;
pub mod heater;
pub mod ports;
pub mod status;

mod error;

pub use error::{ConfigError, Error, HeaterError, Result, StateError};
