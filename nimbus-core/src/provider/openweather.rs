use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{Result, WeatherError},
    model::{Coordinates, CurrentConditions, ForecastSample, Place, round_temp},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const UNITS: &str = "metric";
const REVERSE_LIMIT: &str = "1";
const DIRECT_LIMIT: &str = "5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, what, "Requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let err = upstream_error(what, status, &body);
            tracing::debug!(%status, error = %err, "OpenWeather request failed");
            return Err(err);
        }

        serde_json::from_str(&body)
            .map_err(|err| WeatherError::MalformedResponse(format!("{what}: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwCurrentMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

impl OwCurrentResponse {
    fn into_conditions(self) -> Result<CurrentConditions> {
        let weather = self.weather.into_iter().next().ok_or_else(|| {
            WeatherError::MalformedResponse("current weather: empty `weather` array".into())
        })?;

        Ok(CurrentConditions {
            location: self.name,
            temperature: round_temp(self.main.temp),
            humidity: self.main.humidity.min(100),
            wind_speed: self.wind.speed,
            description: weather.description,
            icon: weather.icon,
            temp_min: round_temp(self.main.temp_min),
            temp_max: round_temp(self.main.temp_max),
        })
    }
}

impl OwForecastEntry {
    fn into_sample(self) -> Result<ForecastSample> {
        let weather = self.weather.into_iter().next().ok_or_else(|| {
            WeatherError::MalformedResponse(format!(
                "forecast: entry {} has an empty `weather` array",
                self.dt
            ))
        })?;

        Ok(ForecastSample {
            timestamp: self.dt,
            temperature: self.main.temp,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            description: weather.description,
            icon: weather.icon,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_by_name(&self, query: &str) -> Result<CurrentConditions> {
        let parsed: OwCurrentResponse = self
            .get_json(
                "current weather",
                "/data/2.5/weather",
                &[("q", query.to_string()), ("units", UNITS.to_string())],
            )
            .await?;

        parsed.into_conditions()
    }

    async fn current_by_coordinates(&self, coords: Coordinates) -> Result<CurrentConditions> {
        let parsed: OwCurrentResponse = self
            .get_json(
                "current weather",
                "/data/2.5/weather",
                &[
                    ("lat", coords.lat.to_string()),
                    ("lon", coords.lon.to_string()),
                    ("units", UNITS.to_string()),
                ],
            )
            .await?;

        parsed.into_conditions()
    }

    async fn forecast(&self, query: &str) -> Result<Vec<ForecastSample>> {
        let parsed: OwForecastResponse = self
            .get_json(
                "forecast",
                "/data/2.5/forecast",
                &[("q", query.to_string()), ("units", UNITS.to_string())],
            )
            .await?;

        parsed.list.into_iter().map(OwForecastEntry::into_sample).collect()
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Vec<Place>> {
        self.get_json(
            "reverse geocode",
            "/geo/1.0/reverse",
            &[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("limit", REVERSE_LIMIT.to_string()),
            ],
        )
        .await
    }

    async fn direct_geocode(&self, query: &str) -> Result<Vec<Place>> {
        self.get_json(
            "direct geocode",
            "/geo/1.0/direct",
            &[("q", query.to_string()), ("limit", DIRECT_LIMIT.to_string())],
        )
        .await
    }
}

/// Map a non-2xx response to an error, using the body's `message` verbatim
/// when there is one.
fn upstream_error(what: &str, status: StatusCode, body: &str) -> WeatherError {
    let message = serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            format!("OpenWeather {what} request failed with status {status}: {}", truncate_body(body))
        });

    if status == StatusCode::NOT_FOUND {
        WeatherError::LocationNotFound(message)
    } else {
        WeatherError::Upstream { status: status.as_u16(), message }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
