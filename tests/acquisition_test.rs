//! End-to-end acquisition tests: register, start, measure, write, close,
//! all over the in-memory origin server.

use async_trait::async_trait;
use lab_recorder::config::Settings;
use lab_recorder::core::{
    ChannelMap, ErrorCode, Instrument, InstrumentHandle, Reading, Readings, StreamLayout,
};
use lab_recorder::error::{AppResult, RecorderError};
use lab_recorder::field::Field;
use lab_recorder::instrument::MockInstrument;
use lab_recorder::logging::{LogBuffer, Logging, Severity};
use lab_recorder::origin::MockOriginServer;
use lab_recorder::stream::{DataType, Stream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Driver returning a fixed raw value per channel, so conversions can be
/// asserted exactly.
struct FixedInstrument {
    layout: StreamLayout,
    closed: Arc<AtomicBool>,
}

impl FixedInstrument {
    fn raw_value(channel: &str) -> f64 {
        match channel {
            "ai1" => 1.0,
            "ai2" => 10.0,
            _ => 0.0,
        }
    }
}

#[async_trait]
impl Instrument for FixedInstrument {
    fn layout(&self) -> &StreamLayout {
        &self.layout
    }

    async fn start(&mut self) -> AppResult<ErrorCode> {
        Ok(ErrorCode::OK)
    }

    async fn measure(&mut self, stream: Option<&str>) -> AppResult<Readings> {
        match stream {
            Some(name) => {
                let mut reading = Reading::new();
                for (field, channel) in self.channel_map(name)? {
                    reading.insert(field.clone(), Self::raw_value(channel));
                }
                Ok(Readings::Single(reading))
            }
            None => {
                let mut all = std::collections::BTreeMap::new();
                for (name, channels) in &self.layout {
                    let mut reading = Reading::new();
                    for (field, channel) in channels {
                        reading.insert(field.clone(), Self::raw_value(channel));
                    }
                    all.insert(name.clone(), reading);
                }
                Ok(Readings::All(all))
            }
        }
    }

    async fn close(&mut self) -> AppResult<ErrorCode> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(ErrorCode::OK)
    }
}

fn power_layout() -> StreamLayout {
    let mut channels = ChannelMap::new();
    channels.insert("X1".to_string(), "ai1".to_string());
    channels.insert("X2".to_string(), "ai2".to_string());
    let mut layout = StreamLayout::new();
    layout.insert("Hybrid_power".to_string(), channels);
    layout
}

fn fixed_handle() -> (InstrumentHandle, Arc<AtomicBool>) {
    let closed = Arc::new(AtomicBool::new(false));
    let instrument = FixedInstrument {
        layout: power_layout(),
        closed: Arc::clone(&closed),
    };
    let handle = Arc::new(Mutex::new(Box::new(instrument) as Box<dyn Instrument>));
    (handle, closed)
}

fn power_fields() -> Vec<Field> {
    vec![
        Field::new("X1", "ai1").unwrap(),
        Field::new("X2", "ai2")
            .unwrap()
            .with_conversion(|v| 0.55 * v + 0.022, "0.55*v + 0.022")
            .with_unit("mW"),
    ]
}

fn captured_logging(level: Severity) -> (Logging, LogBuffer) {
    let buffer = LogBuffer::new();
    let logging = Logging::with_sinks(level, vec![Box::new(buffer.clone())]);
    (logging, buffer)
}

#[tokio::test]
async fn round_trip_posts_converted_values() {
    let settings = Settings::default();
    let (logging, buffer) = captured_logging(Severity::Data);
    let server = MockOriginServer::new();
    let (instrument, closed) = fixed_handle();
    instrument.lock().await.start().await.unwrap();

    let mut stream = Stream::connect(
        &settings,
        &logging,
        "Hybrid_power",
        DataType::Float,
        power_fields(),
        &server,
        Arc::clone(&instrument),
    )
    .await
    .unwrap();

    let registrations = server.registrations().await;
    assert_eq!(registrations.len(), 1);
    assert_eq!(
        registrations[0].records.get("X2").map(String::as_str),
        Some("float")
    );

    let data = stream.measure().await.unwrap().clone();
    assert_eq!(data.get("X1"), Some(&1.0));
    let x2 = data.get("X2").copied().unwrap();
    assert!((x2 - 5.522).abs() < 1e-12, "{x2}");

    stream.write().await.unwrap();
    let rows = server.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "Hybrid_power");
    assert_eq!(rows[0].1, data);

    // Measured and posted values land at the DATA severity.
    assert!(buffer
        .records()
        .iter()
        .any(|r| r.severity == Severity::Data && r.logger == "Hybrid_power"));

    let (server_code, device_code) = stream.close().await;
    assert_eq!(server_code.unwrap(), ErrorCode::OK);
    assert_eq!(device_code.unwrap(), ErrorCode::OK);
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(
        server.closed_streams().await,
        vec!["Hybrid_power".to_string()]
    );
}

#[tokio::test]
async fn device_close_attempted_when_server_close_fails() {
    let settings = Settings::default();
    let (logging, _buffer) = captured_logging(Severity::Critical);
    let server = MockOriginServer::failing_close();
    let (instrument, closed) = fixed_handle();

    let stream = Stream::connect(
        &settings,
        &logging,
        "Hybrid_power",
        DataType::Float,
        power_fields(),
        &server,
        instrument,
    )
    .await
    .unwrap();

    let (server_result, device_result) = stream.close().await;
    assert!(matches!(server_result, Err(RecorderError::Server(_))));
    assert_eq!(device_result.unwrap(), ErrorCode::OK);
    assert!(closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn mismatched_channel_declaration_fails_fast() {
    let settings = Settings::default();
    let (logging, _buffer) = captured_logging(Severity::Critical);
    let server = MockOriginServer::new();
    let (instrument, _closed) = fixed_handle();

    // X2 wired to the wrong channel compared to the driver's declaration.
    let fields = vec![
        Field::new("X1", "ai1").unwrap(),
        Field::new("X2", "ai7").unwrap(),
    ];
    let err = Stream::connect(
        &settings,
        &logging,
        "Hybrid_power",
        DataType::Float,
        fields,
        &server,
        instrument,
    )
    .await
    .expect_err("channel mismatch must fail");

    assert!(matches!(err, RecorderError::Configuration(_)));
    assert!(server.registrations().await.is_empty());
}

#[tokio::test]
async fn mock_instrument_drives_a_full_cycle() {
    let settings = Settings::new(None).expect("shipped default config");
    let (logging, _buffer) = captured_logging(Severity::Critical);
    let server = MockOriginServer::new();

    let mock = MockInstrument::from_settings(power_layout(), &settings).unwrap();
    let instrument: InstrumentHandle =
        Arc::new(Mutex::new(Box::new(mock) as Box<dyn Instrument>));
    instrument.lock().await.start().await.unwrap();

    let mut stream = Stream::connect(
        &settings,
        &logging,
        "Hybrid_power",
        DataType::Float,
        power_fields(),
        &server,
        instrument,
    )
    .await
    .unwrap();

    let data = stream.measure().await.unwrap();
    assert_eq!(data.len(), 2);
    for value in data.values() {
        assert!(value.is_finite());
    }

    stream.write().await.unwrap();
    assert_eq!(server.rows().await.len(), 1);

    let (server_code, device_code) = stream.close().await;
    assert!(server_code.unwrap().is_ok());
    assert!(device_code.unwrap().is_ok());
}
