//! Core traits and data types for the lab logger.
//!
//! This module defines the foundational abstractions for the acquisition
//! system: the [`Instrument`] contract every physical device driver must
//! satisfy, the channel-layout types drivers are constructed with, and the
//! device error-code convention.
//!
//! # Data Flow
//!
//! ```text
//! Instrument --[raw Reading]--> Field conversion --> Stream --> origin server
//! ```
//!
//! # Thread Safety
//!
//! The instrument trait requires `Send + Sync` so drivers can be shared
//! across async tasks behind an [`InstrumentHandle`].

use crate::error::{AppResult, RecorderError};
use async_trait::async_trait;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

// =============================================================================
// Layout and reading types
// =============================================================================

/// Mapping from field name to the physical channel on an instrument.
pub type ChannelMap = BTreeMap<String, String>;

/// Construction-time declaration of which streams an instrument serves:
/// stream name to field-name/channel mapping.
pub type StreamLayout = BTreeMap<String, ChannelMap>;

/// One raw measurement cycle: field name to unconverted value.
pub type Reading = BTreeMap<String, f64>;

/// Result of a measurement request, scoped or not.
///
/// Mirrors the two shapes a driver can return: a flat field/value mapping
/// when a single stream was requested, or one mapping per declared stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Readings {
    /// Measurement of the single requested stream.
    Single(Reading),
    /// Measurement of every declared stream, keyed by stream name.
    All(BTreeMap<String, Reading>),
}

impl Readings {
    /// Returns the single-stream reading, if that is what this is.
    pub fn into_single(self) -> Option<Reading> {
        match self {
            Readings::Single(reading) => Some(reading),
            Readings::All(_) => None,
        }
    }
}

// =============================================================================
// Device error codes
// =============================================================================

/// Error code reported by a device API.
///
/// Zero is success by convention; any other value is driver-defined and can
/// be translated with [`Instrument::describe_error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    /// The universal success code.
    pub const OK: ErrorCode = ErrorCode(0);

    /// Whether this code reports success.
    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Instrument contract
// =============================================================================

/// Shared handle to a driver, as held by streams and any future dispatcher.
pub type InstrumentHandle = Arc<Mutex<Box<dyn Instrument>>>;

/// Contract every physical measurement device driver must satisfy.
///
/// A driver is constructed with a [`StreamLayout`] declaring which logical
/// streams it serves and which hardware channel backs each named field. The
/// trait performs no I/O itself; concrete drivers own the physical
/// connection.
#[async_trait]
pub trait Instrument: Send + Sync {
    /// The construction-time declaration of streams, fields, and channels.
    fn layout(&self) -> &StreamLayout;

    /// Initializes the device and starts its internal measurement process.
    ///
    /// Returns an error code from the device API; the error-code domain is
    /// driver-defined beyond `0 == OK`.
    async fn start(&mut self) -> AppResult<ErrorCode>;

    /// Queries the device for one stream, or for all declared streams when
    /// `stream` is `None`.
    ///
    /// Requesting a stream name that was never declared fails with
    /// [`RecorderError::UnknownStream`]; drivers should route scoped
    /// requests through [`Instrument::channel_map`] to honor that contract.
    async fn measure(&mut self, stream: Option<&str>) -> AppResult<Readings>;

    /// Safely ends the measurement and closes the device connection.
    async fn close(&mut self) -> AppResult<ErrorCode>;

    /// Names of the streams this driver declared.
    fn stream_names(&self) -> Vec<&str> {
        self.layout().keys().map(String::as_str).collect()
    }

    /// Channel map for one declared stream, or `UnknownStream`.
    fn channel_map(&self, stream: &str) -> AppResult<&ChannelMap> {
        self.layout()
            .get(stream)
            .ok_or_else(|| RecorderError::UnknownStream(stream.to_string()))
    }

    /// Human-readable meaning of a device error code.
    ///
    /// The base domain is `{0: "OK"}`; drivers override this with their
    /// device's table.
    fn describe_error(&self, code: ErrorCode) -> Cow<'static, str> {
        if code.is_ok() {
            Cow::Borrowed("OK")
        } else {
            Cow::Owned(format!("unknown error code {code}"))
        }
    }
}
