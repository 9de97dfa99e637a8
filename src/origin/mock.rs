//! An in-memory origin server for tests and development.

use super::{OriginServer, RecordSchema, RecordValues, StreamConnection};
use crate::core::ErrorCode;
use crate::error::{AppResult, RecorderError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One recorded registration call.
#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    /// Stream name passed at registration.
    pub stream: String,
    /// Declared record schema.
    pub records: RecordSchema,
    /// Timeout handed to the server.
    pub timeout: Duration,
}

#[derive(Default)]
struct MockState {
    registrations: Vec<Registration>,
    rows: Vec<(String, RecordValues)>,
    closed: Vec<String>,
}

/// Origin server double that records every interaction.
///
/// Clones share state, so a test can keep one handle while the stream owns
/// another.
#[derive(Clone, Default)]
pub struct MockOriginServer {
    state: Arc<Mutex<MockState>>,
    fail_close: bool,
}

impl MockOriginServer {
    /// A well-behaved server.
    pub fn new() -> Self {
        Self::default()
    }

    /// A server whose connections refuse to close, for fan-out tests.
    pub fn failing_close() -> Self {
        Self {
            state: Arc::default(),
            fail_close: true,
        }
    }

    /// Every registration seen so far.
    pub async fn registrations(&self) -> Vec<Registration> {
        self.state.lock().await.registrations.clone()
    }

    /// Every published row, as (stream, values) pairs.
    pub async fn rows(&self) -> Vec<(String, RecordValues)> {
        self.state.lock().await.rows.clone()
    }

    /// Names of streams whose connections were closed.
    pub async fn closed_streams(&self) -> Vec<String> {
        self.state.lock().await.closed.clone()
    }
}

#[async_trait]
impl OriginServer for MockOriginServer {
    async fn register_stream(
        &self,
        stream: &str,
        records: &RecordSchema,
        timeout: Duration,
    ) -> AppResult<Box<dyn StreamConnection>> {
        let mut state = self.state.lock().await;
        state.registrations.push(Registration {
            stream: stream.to_string(),
            records: records.clone(),
            timeout,
        });
        Ok(Box::new(MockConnection {
            stream: stream.to_string(),
            state: Arc::clone(&self.state),
            fail_close: self.fail_close,
        }))
    }
}

struct MockConnection {
    stream: String,
    state: Arc<Mutex<MockState>>,
    fail_close: bool,
}

#[async_trait]
impl StreamConnection for MockConnection {
    async fn send(&mut self, values: &RecordValues) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.rows.push((self.stream.clone(), values.clone()));
        Ok(())
    }

    async fn close(&mut self) -> AppResult<ErrorCode> {
        if self.fail_close {
            return Err(RecorderError::Server(format!(
                "connection for '{}' refused to close",
                self.stream
            )));
        }
        self.state.lock().await.closed.push(self.stream.clone());
        Ok(ErrorCode::OK)
    }
}
