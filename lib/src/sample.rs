use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

// SampleSeries is an ordered run of samples, ascending by timestamp.
pub type SampleSeries = Vec<Sample>;

// Sample is a single reading of a sensor series. A missing reading is
// represented by an absent value rather than being dropped, so callers can
// still see the gap after reduction.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Sample {
    #[serde(with = "humantime_serde")]
    pub timestamp: SystemTime,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: SystemTime, value: f64) -> Self {
        Sample {
            timestamp,
            value: Some(value),
        }
    }

    pub fn absent(timestamp: SystemTime) -> Self {
        Sample {
            timestamp,
            value: None,
        }
    }

    /// Timestamp as fractional seconds since the Unix epoch. Instants before
    /// the epoch map to negative values so ordering is preserved.
    pub fn x(&self) -> f64 {
        match self.timestamp.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs_f64(),
            Err(e) => -e.duration().as_secs_f64(),
        }
    }

    // Ordinate returns the (x, y) pair used by the geometric path, or None if
    // the value is absent or not a finite number.
    pub fn ordinate(&self) -> Option<(f64, f64)> {
        match self.value {
            Some(y) if y.is_finite() => Some((self.x(), y)),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.ordinate().is_some()
    }
}
