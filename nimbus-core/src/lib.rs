//! Core library for the `nimbus` weather client.
//!
//! This crate defines:
//! - Configuration handling
//! - The OpenWeather client behind the `WeatherProvider` trait
//! - Location resolution, forecast aggregation and debounced suggestions
//! - The persisted favorites list and the pending-selection handoff
//! - `WeatherSession`, which ties the pieces together for a front end
//!
//! It is used by `nimbus-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod favorites;
pub mod geolocation;
pub mod handoff;
pub mod model;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod store;
pub mod suggest;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::WeatherError;
pub use favorites::FavoritesStore;
pub use geolocation::{FixedPosition, Geolocator, NoSensor};
pub use handoff::Handoff;
pub use model::{
    Coordinates, CurrentConditions, DailyPoint, ForecastSample, HourlyPoint, Place, SessionState,
    SessionStatus, WeatherReport,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use resolver::{FetchTarget, LocationResolver};
pub use session::{BootstrapSource, RequestToken, WeatherSession};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use suggest::{SuggestionDebouncer, Suggestions};
