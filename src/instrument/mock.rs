//! A mock instrument that generates synthetic data.

use crate::config::Settings;
use crate::core::{ErrorCode, Instrument, Reading, Readings, StreamLayout};
use crate::error::{AppResult, RecorderError};
use async_trait::async_trait;
use log::info;
use rand::Rng;
use std::borrow::Cow;
use std::collections::BTreeMap;

const DEFAULT_NOISE: f64 = 0.05;

/// Device code reported when the instrument is used before `start`.
pub const ERR_NOT_ARMED: ErrorCode = ErrorCode(1);

/// Synthetic driver producing a slow sine per channel plus noise.
#[derive(Debug)]
pub struct MockInstrument {
    layout: StreamLayout,
    noise: f64,
    armed: bool,
    ticks: u64,
}

impl MockInstrument {
    /// A mock serving `layout` with the default noise amplitude.
    pub fn new(layout: StreamLayout) -> Self {
        Self {
            layout,
            noise: DEFAULT_NOISE,
            armed: false,
            ticks: 0,
        }
    }

    /// A mock configured from the `[instruments.mock]` settings table.
    pub fn from_settings(layout: StreamLayout, settings: &Settings) -> AppResult<Self> {
        let mut instrument = Self::new(layout);
        if let Some(table) = settings.instruments.get("mock") {
            if let Some(value) = table.get("noise") {
                instrument.noise = value.as_float().ok_or_else(|| {
                    RecorderError::Configuration(
                        "'noise' in the mock instrument table must be a float".to_string(),
                    )
                })?;
                if instrument.noise < 0.0 {
                    return Err(RecorderError::Configuration(
                        "'noise' in the mock instrument table must be non-negative".to_string(),
                    ));
                }
            }
        }
        Ok(instrument)
    }

    fn sample(&self, channel: &str) -> f64 {
        let phase = self.ticks as f64 * 0.1;
        // Offset per channel so parallel channels stay distinguishable.
        let offset: f64 = channel.bytes().map(f64::from).sum::<f64>() * 0.01;
        let noise = if self.noise > 0.0 {
            rand::thread_rng().gen_range(-self.noise..=self.noise)
        } else {
            0.0
        };
        (phase + offset).sin() + noise
    }

    fn read_stream(&self, stream: &str) -> AppResult<Reading> {
        let channels: Vec<(String, String)> = self
            .channel_map(stream)?
            .iter()
            .map(|(field, channel)| (field.clone(), channel.clone()))
            .collect();

        let mut reading = Reading::new();
        for (field, channel) in channels {
            reading.insert(field, self.sample(&channel));
        }
        Ok(reading)
    }
}

#[async_trait]
impl Instrument for MockInstrument {
    fn layout(&self) -> &StreamLayout {
        &self.layout
    }

    async fn start(&mut self) -> AppResult<ErrorCode> {
        info!("mock instrument armed, serving {} stream(s)", self.layout.len());
        self.armed = true;
        self.ticks = 0;
        Ok(ErrorCode::OK)
    }

    async fn measure(&mut self, stream: Option<&str>) -> AppResult<Readings> {
        if !self.armed {
            return Err(RecorderError::Instrument(format!(
                "mock instrument measured before start ({})",
                self.describe_error(ERR_NOT_ARMED)
            )));
        }
        self.ticks += 1;
        match stream {
            Some(name) => Ok(Readings::Single(self.read_stream(name)?)),
            None => {
                let names: Vec<String> = self.layout.keys().cloned().collect();
                let mut all = BTreeMap::new();
                for name in names {
                    all.insert(name.clone(), self.read_stream(&name)?);
                }
                Ok(Readings::All(all))
            }
        }
    }

    async fn close(&mut self) -> AppResult<ErrorCode> {
        info!("mock instrument closed");
        self.armed = false;
        Ok(ErrorCode::OK)
    }

    fn describe_error(&self, code: ErrorCode) -> Cow<'static, str> {
        match code {
            ErrorCode::OK => Cow::Borrowed("OK"),
            ERR_NOT_ARMED => Cow::Borrowed("not armed"),
            other => Cow::Owned(format!("unknown error code {other}")),
        }
    }
}
