//! Streams: named, typed groups of fields registered with the origin server.
//!
//! A [`Stream`] organizes the connection to both the origin server and the
//! measurement device for one group of data points. Construction is the
//! whole lifecycle entrance: validation, field bookkeeping, and server
//! registration all happen in [`Stream::connect`], so a stream that exists
//! is always registered. [`Stream::close`] consumes the stream; there is no
//! reusable closed state.

use crate::config::Settings;
use crate::core::{ChannelMap, ErrorCode, InstrumentHandle};
use crate::error::{AppResult, RecorderError};
use crate::field::Field;
use crate::logging::{Logger, Logging, Severity};
use crate::origin::{OriginServer, RecordSchema, RecordValues, StreamConnection};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Server-side type of every field in a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Signed integer records.
    Int,
    /// Floating point records.
    Float,
    /// Boolean records.
    Bool,
    /// Text records.
    Str,
}

impl DataType {
    /// The type string the origin server expects in the record schema.
    /// Note that `Str` registers as `"string"`.
    pub fn serv_name(&self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Bool => "bool",
            DataType::Str => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Bool => "bool",
            DataType::Str => "str",
        };
        f.write_str(name)
    }
}

impl FromStr for DataType {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "int" => Ok(DataType::Int),
            "float" => Ok(DataType::Float),
            "bool" => Ok(DataType::Bool),
            "str" => Ok(DataType::Str),
            other => Err(RecorderError::InvalidDataType(other.to_string())),
        }
    }
}

/// A named, typed collection of fields bound to one server connection and
/// one instrument.
pub struct Stream {
    name: String,
    data_type: DataType,
    fields: BTreeMap<String, Field>,
    records: RecordSchema,
    data: RecordValues,
    connection: Box<dyn StreamConnection>,
    instrument: InstrumentHandle,
    logger: Logger,
}

impl Stream {
    /// Validates the stream declaration and registers it with the server.
    ///
    /// The stream name must be formatted `{namespace}_{descriptive string}`
    /// with the namespace taken from `settings`. Field names must be
    /// unique, and when the instrument declares this stream, the fields'
    /// addresses must agree with the declared channel map. The record
    /// schema maps every field name to `data_type.serv_name()` and is
    /// handed to the server together with the configured timeout.
    ///
    /// There is no unconnected stream: if registration fails, no `Stream`
    /// value exists.
    pub async fn connect(
        settings: &Settings,
        logging: &Logging,
        name: impl Into<String>,
        data_type: DataType,
        fields: Vec<Field>,
        server: &dyn OriginServer,
        instrument: InstrumentHandle,
    ) -> AppResult<Self> {
        let name = name.into();
        validate_stream_name(&name, &settings.namespace)?;

        let mut field_map = BTreeMap::new();
        for field in fields {
            if field_map.contains_key(field.name()) {
                return Err(RecorderError::Configuration(format!(
                    "duplicate field '{}' in stream '{name}'",
                    field.name()
                )));
            }
            field_map.insert(field.name().to_string(), field);
        }

        {
            let guard = instrument.lock().await;
            if let Ok(declared) = guard.channel_map(&name) {
                let expected: ChannelMap = field_map
                    .iter()
                    .map(|(field_name, field)| (field_name.clone(), field.address().to_string()))
                    .collect();
                if *declared != expected {
                    return Err(RecorderError::Configuration(format!(
                        "stream '{name}' fields do not match the instrument's declared channels \
                         (declared {declared:?}, configured {expected:?})"
                    )));
                }
            }
        }

        let records: RecordSchema = field_map
            .keys()
            .map(|field_name| (field_name.clone(), data_type.serv_name().to_string()))
            .collect();

        let logger = logging.child(name.clone(), Severity::Data);
        logger.debug(format!("Connecting stream {name}, records {records:?}"));

        let connection = server
            .register_stream(&name, &records, settings.server.timeout)
            .await?;

        Ok(Self {
            name,
            data_type,
            fields: field_map,
            records,
            data: RecordValues::new(),
            connection,
            instrument,
            logger,
        })
    }

    /// Instructs the device to measure this stream and caches the
    /// converted values.
    ///
    /// The raw reading comes from the bound instrument scoped to this
    /// stream's name; each value is passed through its field's conversion
    /// before caching. The cache is overwritten on every cycle.
    pub async fn measure(&mut self) -> AppResult<&RecordValues> {
        let readings = {
            let mut guard = self.instrument.lock().await;
            guard.measure(Some(&self.name)).await?
        };
        let reading = readings.into_single().ok_or_else(|| {
            RecorderError::Instrument(format!(
                "instrument returned multi-stream data for single stream '{}'",
                self.name
            ))
        })?;

        self.data.clear();
        for (field_name, raw) in reading {
            match self.fields.get(&field_name) {
                Some(field) => {
                    self.data.insert(field_name, field.convert(raw));
                }
                None => self.logger.warning(format!(
                    "instrument reported undeclared field '{field_name}' for stream '{}'",
                    self.name
                )),
            }
        }

        self.logger.data(format!("measured {:?}", self.data));
        Ok(&self.data)
    }

    /// Publishes the most recently measured values to the origin server.
    pub async fn write(&mut self) -> AppResult<()> {
        if self.data.is_empty() {
            return Err(RecorderError::NothingMeasured(self.name.clone()));
        }
        self.connection.send(&self.data).await?;
        self.logger.data(format!("posted {:?}", self.data));
        Ok(())
    }

    /// Closes the connection to the server and to the device.
    ///
    /// Best-effort fan-out: the device close is attempted even when the
    /// server close fails, and both outcomes are returned as a
    /// (server, device) pair. Consuming `self` makes reuse after close a
    /// compile error.
    pub async fn close(mut self) -> (AppResult<ErrorCode>, AppResult<ErrorCode>) {
        let server_result = self.connection.close().await;
        if let Err(err) = &server_result {
            self.logger
                .warning(format!("server connection close failed: {err}"));
        }

        let device_result = {
            let mut guard = self.instrument.lock().await;
            guard.close().await
        };
        if let Err(err) = &device_result {
            self.logger.warning(format!("instrument close failed: {err}"));
        }

        (server_result, device_result)
    }

    /// Name of this stream on the origin server.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared data type of this stream's records.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The type string this stream registered with.
    pub fn serv_data_type(&self) -> &'static str {
        self.data_type.serv_name()
    }

    /// Fields keyed by name.
    pub fn fields(&self) -> &BTreeMap<String, Field> {
        &self.fields
    }

    /// The record schema this stream registered with.
    pub fn records(&self) -> &RecordSchema {
        &self.records
    }

    /// Most recently measured converted values, if any.
    pub fn data(&self) -> &RecordValues {
        &self.data
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn validate_stream_name(name: &str, namespace: &str) -> AppResult<()> {
    let descriptive = name
        .strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('_'));
    match descriptive {
        Some(rest) if !rest.is_empty() => Ok(()),
        _ => Err(RecorderError::Configuration(format!(
            "stream name '{name}' must be formatted '{namespace}_<descriptive string>'"
        ))),
    }
}
