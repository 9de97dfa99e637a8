//! Origin telemetry-server boundary.
//!
//! The real origin server is an external system; this module models only
//! the operations the logger actually needs from it. A stream registers
//! itself once with [`OriginServer::register_stream`] and afterwards talks
//! to the returned [`StreamConnection`].

pub mod mock;

pub use mock::MockOriginServer;

use crate::core::ErrorCode;
use crate::error::AppResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// Registration schema: field name to server-side type string.
pub type RecordSchema = BTreeMap<String, String>;

/// One published row: field name to converted value.
pub type RecordValues = BTreeMap<String, f64>;

/// The remote telemetry server streams register with.
#[async_trait]
pub trait OriginServer: Send + Sync {
    /// Registers a stream under `stream`, declaring its record schema, and
    /// returns the live connection for it. `timeout` is interpreted by the
    /// server client; no timeout is enforced on this code path.
    async fn register_stream(
        &self,
        stream: &str,
        records: &RecordSchema,
        timeout: Duration,
    ) -> AppResult<Box<dyn StreamConnection>>;
}

/// A live, registered stream connection.
#[async_trait]
pub trait StreamConnection: Send + Sync {
    /// Publishes one record of converted values.
    async fn send(&mut self, values: &RecordValues) -> AppResult<()>;

    /// Closes the connection, returning the server's error code.
    async fn close(&mut self) -> AppResult<ErrorCode>;
}
