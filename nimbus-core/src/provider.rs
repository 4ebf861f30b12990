use crate::{
    Config,
    error::Result,
    model::{Coordinates, CurrentConditions, ForecastSample, Place},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// The upstream calls the pipeline relies on.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Resolve `query` and return its current conditions in one round trip.
    async fn current_by_name(&self, query: &str) -> Result<CurrentConditions>;

    async fn current_by_coordinates(&self, coords: Coordinates) -> Result<CurrentConditions>;

    /// Forecast series for `query`, ascending by timestamp.
    async fn forecast(&self, query: &str) -> Result<Vec<ForecastSample>>;

    /// At most one place near `coords`.
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Vec<Place>>;

    /// Up to five places matching `query`.
    async fn direct_geocode(&self, query: &str) -> Result<Vec<Place>>;
}

#[async_trait]
impl<T: WeatherProvider + ?Sized> WeatherProvider for Arc<T> {
    async fn current_by_name(&self, query: &str) -> Result<CurrentConditions> {
        (**self).current_by_name(query).await
    }

    async fn current_by_coordinates(&self, coords: Coordinates) -> Result<CurrentConditions> {
        (**self).current_by_coordinates(coords).await
    }

    async fn forecast(&self, query: &str) -> Result<Vec<ForecastSample>> {
        (**self).forecast(query).await
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Vec<Place>> {
        (**self).reverse_geocode(coords).await
    }

    async fn direct_geocode(&self, query: &str) -> Result<Vec<Place>> {
        (**self).direct_geocode(query).await
    }
}

/// Construct the OpenWeather client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `nimbus configure` and enter your API key."
        )
    })?;

    let provider = match config.base_url.as_deref() {
        Some(base_url) => OpenWeatherProvider::with_base_url(api_key.to_owned(), base_url),
        None => OpenWeatherProvider::new(api_key.to_owned()),
    };

    Ok(provider)
}
