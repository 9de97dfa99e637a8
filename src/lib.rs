//! Core library for the lab_recorder application.
//!
//! This library contains the configuration model, instrument contract, and
//! origin-server boundary for a laboratory data-acquisition logger: it
//! polls physical instruments on defined streams of measurement channels,
//! converts raw readings to physical units, and forwards them to an Origin
//! telemetry server.

pub mod config;
pub mod core;
pub mod error;
pub mod field;
pub mod instrument;
pub mod logging;
pub mod origin;
pub mod recorder;
pub mod stream;
