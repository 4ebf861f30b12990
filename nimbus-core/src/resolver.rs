//! Turns user input into something the weather endpoints accept.

use crate::{
    error::{Result, WeatherError},
    model::{Coordinates, Place},
    provider::WeatherProvider,
};

/// Inputs shorter than this never produce suggestions.
pub const MIN_SUGGESTION_LEN: usize = 3;

/// A canonical location query for the "weather by query" endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget(String);

impl FetchTarget {
    pub fn query(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub struct LocationResolver<'a, P: WeatherProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: WeatherProvider + ?Sized> LocationResolver<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Validate a free-text query. The weather endpoint resolves it in the
    /// same round trip that fetches conditions.
    pub fn resolve_by_name(&self, query: &str) -> Result<FetchTarget> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(WeatherError::InvalidQuery);
        }
        Ok(FetchTarget(trimmed.to_string()))
    }

    /// Reverse-geocode `coords` to a place name, falling back to the name the
    /// weather endpoint reports for the same coordinates.
    pub async fn resolve_by_coordinates(&self, coords: Coordinates) -> Result<FetchTarget> {
        if !coords.is_valid() {
            return Err(WeatherError::InvalidCoordinates { lat: coords.lat, lon: coords.lon });
        }

        let places = self.provider.reverse_geocode(coords).await?;
        if let Some(place) = places.into_iter().find(|p| !p.name.trim().is_empty()) {
            tracing::debug!(name = %place.name, "Reverse geocoded coordinates");
            return Ok(FetchTarget(place.name));
        }

        tracing::debug!(lat = coords.lat, lon = coords.lon, "No reverse geocode match, asking weather endpoint");
        let current = self.provider.current_by_coordinates(coords).await?;
        if current.location.trim().is_empty() {
            return Err(WeatherError::LocationNotFound(format!(
                "no place found at {}, {}",
                coords.lat, coords.lon
            )));
        }
        Ok(FetchTarget(current.location))
    }

    /// Autocomplete candidates for partially typed input.
    pub async fn suggest(&self, input: &str) -> Result<Vec<Place>> {
        let trimmed = input.trim();
        if trimmed.chars().count() < MIN_SUGGESTION_LEN {
            return Ok(Vec::new());
        }
        self.provider.direct_geocode(trimmed).await
    }
}
