use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::{Result, WeatherError},
    model::Coordinates,
};

/// Source of the device position.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    /// Current position, or [`WeatherError::SensorDenied`] when unavailable.
    async fn current_position(&self) -> Result<Coordinates>;
}

/// Always reports the same coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl Geolocator for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates> {
        if self.0.is_valid() {
            Ok(self.0)
        } else {
            Err(WeatherError::SensorDenied(format!(
                "invalid position {}, {}",
                self.0.lat, self.0.lon
            )))
        }
    }
}

/// No sensor at all; every read is denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensor;

#[async_trait]
impl Geolocator for NoSensor {
    async fn current_position(&self) -> Result<Coordinates> {
        Err(WeatherError::SensorDenied("no location sensor configured".into()))
    }
}

/// Pick [`FixedPosition`] when coordinates are known, otherwise [`NoSensor`].
pub fn geolocator_for(position: Option<Coordinates>) -> Box<dyn Geolocator> {
    match position {
        Some(coords) => Box::new(FixedPosition(coords)),
        None => Box::new(NoSensor),
    }
}
