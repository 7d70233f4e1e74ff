//! Bearing source selection and heading readings.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;
use crate::geo::normalize_degrees;

/// Which heading stream drives marker rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BearingSource {
    /// No rotation.
    #[default]
    None,
    /// Direction of travel reported by, or derived from, GPS fixes.
    Gps,
    /// Device orientation from the magnetometer.
    Compass,
}

impl BearingSource {
    /// Config and CLI spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            BearingSource::None => "none",
            BearingSource::Gps => "gps",
            BearingSource::Compass => "compass",
        }
    }

    /// The sensor that feeds this source, if any.
    pub fn sensor(&self) -> Option<HeadingSensor> {
        match self {
            BearingSource::None => None,
            BearingSource::Gps => Some(HeadingSensor::Gps),
            BearingSource::Compass => Some(HeadingSensor::Compass),
        }
    }
}

impl fmt::Display for BearingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BearingSource {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(BearingSource::None),
            "gps" => Ok(BearingSource::Gps),
            "compass" => Ok(BearingSource::Compass),
            _ => Err(ParseEnumError {
                kind: "bearing source",
                value: s.to_string(),
                expected: "none, gps, compass",
            }),
        }
    }
}

/// A physical heading sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingSensor {
    Gps,
    Compass,
}

impl HeadingSensor {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingSensor::Gps => "gps",
            HeadingSensor::Compass => "compass",
        }
    }
}

impl fmt::Display for HeadingSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HeadingSensor> for BearingSource {
    fn from(sensor: HeadingSensor) -> Self {
        match sensor {
            HeadingSensor::Gps => BearingSource::Gps,
            HeadingSensor::Compass => BearingSource::Compass,
        }
    }
}

/// A heading sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingReading {
    /// Heading in degrees, normalized into `[0, 360)`.
    pub heading_degrees: f64,
    /// Estimated error in degrees.
    pub accuracy_degrees: f64,
    /// Sensor that produced the reading.
    pub source: HeadingSensor,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl BearingReading {
    /// Create a reading. The heading is normalized into `[0, 360)`.
    pub fn new(
        heading_degrees: f64,
        accuracy_degrees: f64,
        source: HeadingSensor,
        timestamp_ms: i64,
    ) -> Self {
        let heading_degrees = if heading_degrees.is_finite() {
            normalize_degrees(heading_degrees)
        } else {
            heading_degrees
        };
        Self {
            heading_degrees,
            accuracy_degrees,
            source,
            timestamp_ms,
        }
    }

    /// A reading is usable when its heading is finite.
    pub fn is_valid(&self) -> bool {
        self.heading_degrees.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearing_source() {
        assert_eq!("none".parse::<BearingSource>(), Ok(BearingSource::None));
        assert_eq!("GPS".parse::<BearingSource>(), Ok(BearingSource::Gps));
        assert_eq!(" compass ".parse::<BearingSource>(), Ok(BearingSource::Compass));
        assert!("sonar".parse::<BearingSource>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for source in [BearingSource::None, BearingSource::Gps, BearingSource::Compass] {
            assert_eq!(source.to_string().parse::<BearingSource>(), Ok(source));
        }
    }

    #[test]
    fn test_sensor_mapping() {
        assert_eq!(BearingSource::None.sensor(), None);
        assert_eq!(BearingSource::Gps.sensor(), Some(HeadingSensor::Gps));
        assert_eq!(BearingSource::from(HeadingSensor::Compass), BearingSource::Compass);
    }

    #[test]
    fn test_reading_heading_is_normalized() {
        let reading = BearingReading::new(-90.0, 5.0, HeadingSensor::Compass, 0);
        assert!((reading.heading_degrees - 270.0).abs() < 1e-9);

        let reading = BearingReading::new(720.0, 5.0, HeadingSensor::Compass, 0);
        assert!(reading.heading_degrees.abs() < 1e-9);
    }

    #[test]
    fn test_nan_reading_is_invalid() {
        let reading = BearingReading::new(f64::NAN, 5.0, HeadingSensor::Gps, 0);
        assert!(!reading.is_valid());
    }
}
