// Sensor reading domain models
use chrono::{DateTime, Duration, FixedOffset, Utc};

pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;
pub const DEFAULT_GRID_STEP: i64 = 50;

/// Temperatures a sensor can plausibly report, in °C
pub const TEMPERATURE_BOUNDS: (f64, f64) = (-100.0, 100.0);
pub const MAX_HUMIDITY: f64 = 100.0;

/// A single temperature/humidity reading.
/// A negative humidity means the sensor did not report one.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, temperature: f64, humidity: f64) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
        }
    }

    /// Temperature inside [`TEMPERATURE_BOUNDS`] and humidity either
    /// missing or at most 100 %
    pub fn is_plausible(&self) -> bool {
        let (low, high) = TEMPERATURE_BOUNDS;
        (low..=high).contains(&self.temperature)
            && !self.humidity.is_nan()
            && self.humidity <= MAX_HUMIDITY
    }

    pub fn has_humidity(&self) -> bool {
        self.humidity.is_finite() && self.humidity >= 0.0
    }

    /// Temperature in tenths of a degree, or `None` for NaN/inf readings
    pub fn tenths(&self) -> Option<i64> {
        if self.temperature.is_finite() {
            Some((self.temperature * 10.0).round() as i64)
        } else {
            None
        }
    }
}

/// The time span being charted, ending at `end` in the viewer's zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub end: DateTime<FixedOffset>,
    pub lookback_hours: i64,
}

impl Window {
    pub fn new(end: DateTime<FixedOffset>, lookback_hours: i64) -> Self {
        Self {
            end,
            lookback_hours,
        }
    }

    pub fn last_day(end: DateTime<FixedOffset>) -> Self {
        Self::new(end, DEFAULT_LOOKBACK_HOURS)
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.end - Duration::hours(self.lookback_hours)
    }

    pub fn total_minutes(&self) -> i64 {
        self.lookback_hours * 60
    }
}

/// Temperature axis bounds in tenths of a degree, snapped to `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl AxisRange {
    pub fn span(&self) -> i64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// One unbroken run of plotted points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub points: Vec<Point>,
}

impl Segment {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }
}
