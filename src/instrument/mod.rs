//! Instrument drivers.
//!
//! Concrete implementations of the [`crate::core::Instrument`] contract.
//! Real device drivers live outside this repository; the mock driver here
//! supports tests and development without hardware.

pub mod mock;

pub use mock::MockInstrument;
