use thiserror::Error;

/// Errors raised by the acquisition pipeline.
///
/// The `Display` output is what the session shows to the user, so variants
/// carrying an upstream message render it verbatim.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location query must not be empty")]
    InvalidQuery,

    #[error("Invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("{0}")]
    LocationNotFound(String),

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response from weather service: {0}")]
    MalformedResponse(String),

    #[error("Location sensor unavailable: {0}")]
    SensorDenied(String),

    #[error("Malformed persisted state: {0}")]
    MalformedPersistedState(String),

    #[error("Failed to persist state: {0}")]
    Persist(String),
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
