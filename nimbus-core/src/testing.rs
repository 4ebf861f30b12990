//! In-memory provider for unit tests.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;

use crate::{
    error::{Result, WeatherError},
    model::{Coordinates, CurrentConditions, ForecastSample, Place},
    provider::WeatherProvider,
    store::{KeyValueStore, MemoryStore},
};

// 2024-03-01T00:00:00Z
pub const MARCH_1: i64 = 1_709_251_200;

#[derive(Debug, Default)]
struct FakeState {
    current: HashMap<String, CurrentConditions>,
    forecast: HashMap<String, Vec<ForecastSample>>,
    reverse: Vec<Place>,
    direct: Vec<Place>,
    calls: HashMap<&'static str, usize>,
    direct_queries: Vec<String>,
}

/// Answers from canned data; unknown locations report "city not found".
#[derive(Debug, Default)]
pub struct FakeProvider {
    state: Mutex<FakeState>,
}

pub fn conditions(location: &str, temperature: i32) -> CurrentConditions {
    CurrentConditions {
        location: location.into(),
        temperature,
        humidity: 70,
        wind_speed: 4.1,
        description: "light rain".into(),
        icon: "10d".into(),
        temp_min: temperature - 3,
        temp_max: temperature + 3,
    }
}

/// `count` samples three hours apart starting at [`MARCH_1`].
pub fn samples(count: usize) -> Vec<ForecastSample> {
    (0..count)
        .map(|i| ForecastSample {
            timestamp: MARCH_1 + i as i64 * 3 * 3600,
            temperature: 10.0 + i as f64,
            temp_min: 9.0 + i as f64,
            temp_max: 11.0 + i as f64,
            description: "clear sky".into(),
            icon: "01d".into(),
        })
        .collect()
}

impl FakeProvider {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: &'static str) {
        *self.lock().calls.entry(call).or_default() += 1;
    }

    /// Known location with a 16-sample forecast.
    pub fn with_current(self, location: &str, temperature: i32) -> Self {
        self.set_current(location, temperature);
        self.lock().forecast.insert(location.to_string(), samples(16));
        self
    }

    pub fn with_reverse(self, places: Vec<Place>) -> Self {
        self.lock().reverse = places;
        self
    }

    pub fn with_direct(self, places: Vec<Place>) -> Self {
        self.lock().direct = places;
        self
    }

    pub fn set_current(&self, location: &str, temperature: i32) {
        self.lock().current.insert(location.to_string(), conditions(location, temperature));
    }

    pub fn calls(&self, call: &str) -> usize {
        self.lock().calls.get(call).copied().unwrap_or(0)
    }

    pub fn direct_queries(&self) -> Vec<String> {
        self.lock().direct_queries.clone()
    }
}

fn not_found() -> WeatherError {
    WeatherError::LocationNotFound("city not found".into())
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn current_by_name(&self, query: &str) -> Result<CurrentConditions> {
        self.record("current_by_name");
        self.lock().current.get(query).cloned().ok_or_else(not_found)
    }

    async fn current_by_coordinates(&self, _coords: Coordinates) -> Result<CurrentConditions> {
        self.record("current_by_coordinates");
        self.lock().current.values().next().cloned().ok_or_else(not_found)
    }

    async fn forecast(&self, query: &str) -> Result<Vec<ForecastSample>> {
        self.record("forecast");
        self.lock().forecast.get(query).cloned().ok_or_else(not_found)
    }

    async fn reverse_geocode(&self, _coords: Coordinates) -> Result<Vec<Place>> {
        self.record("reverse_geocode");
        Ok(self.lock().reverse.clone())
    }

    async fn direct_geocode(&self, query: &str) -> Result<Vec<Place>> {
        self.record("direct_geocode");
        let mut state = self.lock();
        state.direct_queries.push(query.to_string());
        Ok(state.direct.clone())
    }
}

/// Reads like a [`MemoryStore`] but refuses every write.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
}

impl FailingStore {
    /// Start with `value` already stored under `key`.
    pub fn seeded(key: &str, value: &str) -> Self {
        let mut inner = MemoryStore::new();
        inner.set(key, value).expect("memory store write");
        Self { inner }
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, _value: &str) -> Result<()> {
        Err(WeatherError::Persist(format!("disk full writing {key}")))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        Err(WeatherError::Persist(format!("disk full removing {key}")))
    }
}
