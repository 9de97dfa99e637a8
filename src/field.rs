//! Named, unit-bearing, convertible measurement quantities.
//!
//! A [`Field`] describes one data point within a stream: a human-readable
//! name, the hardware channel it is read from, and a pure conversion from
//! the raw reading to physical units. Fields are created once by the owning
//! stream's setup code and are immutable afterwards; everything is read
//! through accessors.

use crate::error::{AppResult, RecorderError};
use std::fmt;

/// Pure conversion from one raw reading to one physical-unit value.
pub type Conversion = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// One measurable quantity within a stream.
pub struct Field {
    name: String,
    address: String,
    unit: String,
    conversion: Conversion,
    conversion_desc: String,
}

impl Field {
    /// A field reading `address` on the owning instrument, with the
    /// identity conversion and no unit.
    ///
    /// Fails fast on an empty name or address; a field that cannot be
    /// addressed is a configuration error, not something to discover at
    /// measurement time.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> AppResult<Self> {
        let name = name.into();
        let address = address.into();
        if name.trim().is_empty() {
            return Err(RecorderError::Configuration(
                "field name must not be empty".to_string(),
            ));
        }
        if address.trim().is_empty() {
            return Err(RecorderError::Configuration(format!(
                "field '{name}' must name an instrument channel"
            )));
        }
        Ok(Self {
            name,
            address,
            unit: String::new(),
            conversion: Box::new(|raw| raw),
            conversion_desc: "identity".to_string(),
        })
    }

    /// Replaces the conversion. `desc` is the human-readable description of
    /// the formula (closures carry no introspectable documentation).
    pub fn with_conversion(
        mut self,
        conversion: impl Fn(f64) -> f64 + Send + Sync + 'static,
        desc: impl Into<String>,
    ) -> Self {
        self.conversion = Box::new(conversion);
        self.conversion_desc = desc.into();
        self
    }

    /// Sets the display unit of the converted value.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Applies the conversion to one raw reading.
    pub fn convert(&self, raw: f64) -> f64 {
        (self.conversion)(raw)
    }

    /// Field name, unique within the owning stream.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hardware channel identifier on the owning instrument.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Display unit of the converted value.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Human-readable description of the conversion formula.
    pub fn conversion_desc(&self) -> &str {
        &self.conversion_desc
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("unit", &self.unit)
            .field("conversion", &self.conversion_desc)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_conversion_is_identity() {
        let field = Field::new("T1", "ai0").unwrap();
        for raw in [-3.5, 0.0, 1.0, 273.15] {
            assert_eq!(field.convert(raw), raw);
        }
        assert_eq!(field.conversion_desc(), "identity");
        assert_eq!(field.unit(), "");
    }

    #[test]
    fn photodiode_calibration_converts() {
        let field = Field::new("X2", "ai2")
            .unwrap()
            .with_conversion(|v| 0.55 * v + 0.022, "0.55*v + 0.022")
            .with_unit("mW");

        assert!((field.convert(10.0) - 5.522).abs() < 1e-12);
        assert_eq!(field.unit(), "mW");
        assert_eq!(field.address(), "ai2");
    }

    #[test]
    fn empty_name_fails_construction() {
        let err = Field::new("", "ai0").expect_err("empty name must fail");
        assert!(matches!(err, RecorderError::Configuration(_)));
    }

    #[test]
    fn empty_address_fails_construction() {
        let err = Field::new("X1", "  ").expect_err("empty address must fail");
        assert!(matches!(err, RecorderError::Configuration(_)));
    }

    #[test]
    fn debug_shows_conversion_description() {
        let field = Field::new("X1", "ai1")
            .unwrap()
            .with_conversion(|v| v * 2.0, "2*v");
        let rendered = format!("{field:?}");
        assert!(rendered.contains("2*v"));
        assert!(!rendered.contains("closure"));
    }
}
