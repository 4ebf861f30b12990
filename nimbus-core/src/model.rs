use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Snapshot of current conditions for one location.
///
/// Also the shape of a favorites entry, keyed by `location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location: String,
    pub temperature: i32,
    pub humidity: u8,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
    pub temp_min: i32,
    pub temp_max: i32,
}

/// One raw entry of the upstream forecast series (3-hour spacing).
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Unix seconds, UTC.
    pub timestamp: i64,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint {
    pub timestamp: i64,
    /// Local `HH:MM` label.
    pub time: String,
    pub temperature: i32,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub day: NaiveDate,
    /// Short weekday name, e.g. "Mon".
    pub label: String,
    pub temperature: i32,
    pub temp_min: i32,
    pub temp_max: i32,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A geocoding result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl Place {
    pub fn display_name(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

/// Everything one successful request produces.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Observable state of a [`crate::WeatherSession`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub current: Option<CurrentConditions>,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyPoint>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        if self.loading {
            SessionStatus::Loading
        } else if self.error.is_some() {
            SessionStatus::Failed
        } else if self.current.is_some() {
            SessionStatus::Loaded
        } else {
            SessionStatus::Idle
        }
    }
}

/// Round half toward positive infinity, so -2.5 becomes -2 and 2.5 becomes 3.
pub fn round_temp(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
