//! Request orchestration: resolve, fetch, aggregate, reconcile favorites.

use std::fmt;

use chrono::{Local, TimeZone};

use crate::{
    aggregate::{summarize_daily, summarize_hourly},
    config::FALLBACK_LOCATION,
    error::Result,
    favorites::FavoritesStore,
    geolocation::Geolocator,
    handoff::Handoff,
    model::{
        Coordinates, CurrentConditions, DailyPoint, HourlyPoint, SessionState, SessionStatus,
        WeatherReport,
    },
    provider::WeatherProvider,
    resolver::{FetchTarget, LocationResolver},
    store::KeyValueStore,
};

/// Identifies one issued request. Only the most recently issued token may
/// update the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Where [`WeatherSession::bootstrap`] took its location from.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapSource {
    PendingSelection(String),
    Geolocation(Coordinates),
    DefaultLocation(String),
    /// Already bootstrapped, or automatic location is off.
    Skipped,
}

/// Owns the transient request state and the favorites list.
///
/// `Tz` decides the hourly labels and daily day keys.
#[derive(Debug)]
pub struct WeatherSession<P, S, Tz = Local>
where
    P: WeatherProvider,
    S: KeyValueStore,
    Tz: TimeZone,
{
    provider: P,
    favorites: FavoritesStore<S>,
    tz: Tz,
    state: SessionState,
    latest: RequestToken,
    auto_location: bool,
    bootstrapped: bool,
    default_location: String,
}

impl<P, S, Tz> WeatherSession<P, S, Tz>
where
    P: WeatherProvider,
    S: KeyValueStore,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    pub fn new(provider: P, favorites: FavoritesStore<S>, tz: Tz) -> Self {
        Self {
            provider,
            favorites,
            tz,
            state: SessionState::default(),
            latest: RequestToken(0),
            auto_location: true,
            bootstrapped: false,
            default_location: FALLBACK_LOCATION.to_string(),
        }
    }

    pub fn with_default_location(mut self, location: impl Into<String>) -> Self {
        self.default_location = location.into();
        self
    }

    pub fn with_auto_location(mut self, enabled: bool) -> Self {
        self.auto_location = enabled;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn current(&self) -> Option<&CurrentConditions> {
        self.state.current.as_ref()
    }

    pub fn hourly(&self) -> &[HourlyPoint] {
        &self.state.hourly
    }

    pub fn daily(&self) -> &[DailyPoint] {
        &self.state.daily
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn resolver(&self) -> LocationResolver<'_, P> {
        LocationResolver::new(&self.provider)
    }

    pub fn favorites(&self) -> &[CurrentConditions] {
        self.favorites.entries()
    }

    pub fn auto_location(&self) -> bool {
        self.auto_location
    }

    /// Views that browse saved locations turn this off so the bootstrap does
    /// not replace what they are showing.
    pub fn set_auto_location(&mut self, enabled: bool) {
        self.auto_location = enabled;
    }

    /// Fetch by free-text query and apply the outcome.
    pub async fn fetch_weather(&mut self, query: &str) -> SessionStatus {
        self.auto_location = false;
        let token = self.begin_request();
        let outcome = match self.resolver().resolve_by_name(query) {
            Ok(target) => self.load(&target).await,
            Err(err) => Err(err),
        };
        self.complete(token, outcome);
        self.status()
    }

    /// Resolve coordinates to a place name, then fetch it.
    pub async fn fetch_by_coordinates(&mut self, coords: Coordinates) -> SessionStatus {
        self.auto_location = false;
        let token = self.begin_request();
        let outcome = match self.resolver().resolve_by_coordinates(coords).await {
            Ok(target) => self.load(&target).await,
            Err(err) => Err(err),
        };
        self.complete(token, outcome);
        self.status()
    }

    /// Enter `Loading` and issue a fresh token, superseding any earlier one.
    pub fn begin_request(&mut self) -> RequestToken {
        self.latest = RequestToken(self.latest.0 + 1);
        self.state.loading = true;
        self.state.error = None;
        tracing::debug!(token = self.latest.0, "Request started");
        self.latest
    }

    /// Fetch current conditions and forecast concurrently and aggregate them.
    /// Does not touch the session state.
    pub async fn load(&self, target: &FetchTarget) -> Result<WeatherReport> {
        let query = target.query();
        let (current, forecast) = tokio::join!(
            self.provider.current_by_name(query),
            self.provider.forecast(query),
        );
        let current = current?;
        let forecast = forecast?;

        Ok(WeatherReport {
            hourly: summarize_hourly(&forecast, &self.tz),
            daily: summarize_daily(&forecast, &self.tz),
            current,
        })
    }

    /// Apply the outcome of the request identified by `token`.
    ///
    /// Returns `false` and leaves the state alone when a newer request has
    /// been issued since.
    pub fn complete(&mut self, token: RequestToken, outcome: Result<WeatherReport>) -> bool {
        if token != self.latest {
            tracing::debug!(token = token.0, latest = self.latest.0, "Discarding stale response");
            return false;
        }

        self.state = match outcome {
            Ok(report) => {
                tracing::info!(location = %report.current.location, "Weather loaded");
                self.refresh_favorite(&report.current);
                SessionState {
                    current: Some(report.current),
                    hourly: report.hourly,
                    daily: report.daily,
                    loading: false,
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Weather request failed");
                SessionState { error: Some(err.to_string()), ..SessionState::default() }
            }
        };
        true
    }

    /// Pick the first location to show, once per session.
    ///
    /// A pending selection always wins and is consumed. Otherwise, with
    /// automatic location on, the device position is used, falling back to
    /// the default location when the sensor is unavailable.
    pub async fn bootstrap<G, H>(&mut self, geolocator: &G, handoff: &mut Handoff<H>) -> BootstrapSource
    where
        G: Geolocator + ?Sized,
        H: KeyValueStore,
    {
        match handoff.take() {
            Ok(Some(location)) => {
                tracing::info!(%location, "Using pending selection");
                self.bootstrapped = true;
                self.fetch_weather(&location).await;
                return BootstrapSource::PendingSelection(location);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "Could not read pending selection"),
        }

        if self.bootstrapped || !self.auto_location {
            return BootstrapSource::Skipped;
        }
        self.bootstrapped = true;

        match geolocator.current_position().await {
            Ok(coords) => {
                tracing::info!(lat = coords.lat, lon = coords.lon, "Using device position");
                self.fetch_by_coordinates(coords).await;
                BootstrapSource::Geolocation(coords)
            }
            Err(err) => {
                tracing::debug!(error = %err, "No device position, using default location");
                let location = self.default_location.clone();
                self.fetch_weather(&location).await;
                BootstrapSource::DefaultLocation(location)
            }
        }
    }

    /// Save the currently shown conditions. Returns `false` when nothing is shown.
    pub fn add_current_to_favorites(&mut self) -> Result<bool> {
        match self.state.current.clone() {
            Some(current) => self.favorites.add(current).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn add_favorite(&mut self, entry: CurrentConditions) -> Result<()> {
        self.favorites.add(entry)
    }

    pub fn remove_favorite(&mut self, location: &str) -> Result<()> {
        self.favorites.remove(location)
    }

    pub fn is_favorite(&self, location: &str) -> bool {
        self.favorites.contains(location)
    }

    fn refresh_favorite(&mut self, current: &CurrentConditions) {
        if !self.favorites.contains(&current.location) {
            return;
        }
        if let Err(err) = self.favorites.reconcile(current) {
            tracing::warn!(error = %err, location = %current.location, "Failed to persist refreshed favorite");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::WeatherError,
        geolocation::{FixedPosition, NoSensor},
        model::Place,
        store::MemoryStore,
        favorites::FAVORITES_KEY,
        testing::{FailingStore, FakeProvider, conditions},
    };
    use chrono::Utc;

    type TestSession = WeatherSession<FakeProvider, MemoryStore, Utc>;

    fn session(provider: FakeProvider) -> TestSession {
        WeatherSession::new(provider, FavoritesStore::load(MemoryStore::new()), Utc)
    }

    fn place(name: &str) -> Place {
        Place { name: name.into(), country: "GB".into(), state: None }
    }

    #[tokio::test]
    async fn successful_fetch_fills_state() {
        let mut session = session(FakeProvider::default().with_current("London", 15));

        let status = session.fetch_weather("London").await;

        assert_eq!(status, SessionStatus::Loaded);
        assert_eq!(session.current().unwrap().temperature, 15);
        assert_eq!(session.hourly().len(), 6);
        assert_eq!(session.daily().len(), 2);
        assert!(!session.is_loading());
        assert_eq!(session.error(), None);
    }

    #[tokio::test]
    async fn unknown_location_fails_and_clears_previous_snapshot() {
        let mut session = session(FakeProvider::default().with_current("London", 15));
        session.fetch_weather("London").await;

        let status = session.fetch_weather("Nowhereville").await;

        assert_eq!(status, SessionStatus::Failed);
        assert_eq!(session.error(), Some("city not found"));
        assert!(session.current().is_none());
        assert!(session.hourly().is_empty());
        assert!(session.daily().is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn blank_query_fails_without_network() {
        let mut session = session(FakeProvider::default());

        let status = session.fetch_weather("   ").await;

        assert_eq!(status, SessionStatus::Failed);
        assert_eq!(session.error(), Some(WeatherError::InvalidQuery.to_string().as_str()));
        assert_eq!(session.provider().calls("current_by_name"), 0);
    }

    #[tokio::test]
    async fn refetching_a_favorite_updates_it_in_place() {
        let mut session = session(FakeProvider::default().with_current("London", 15));
        session.fetch_weather("London").await;
        assert!(session.add_current_to_favorites().unwrap());

        session.provider().set_current("London", 21);
        session.fetch_weather("London").await;

        assert_eq!(session.favorites().len(), 1);
        assert_eq!(session.favorites()[0].temperature, 21);
    }

    #[tokio::test]
    async fn refresh_write_failure_does_not_fail_the_fetch() {
        let seed = serde_json::to_string(&[conditions("London", 9)]).unwrap();
        let favorites = FavoritesStore::load(FailingStore::seeded(FAVORITES_KEY, &seed));
        let provider = FakeProvider::default().with_current("London", 15);
        let mut session = WeatherSession::new(provider, favorites, Utc);

        let status = session.fetch_weather("London").await;

        assert_eq!(status, SessionStatus::Loaded);
        assert_eq!(session.error(), None);
        assert_eq!(session.favorites()[0].temperature, 15);
        assert!(matches!(session.add_current_to_favorites(), Err(WeatherError::Persist(_))));
        assert_eq!(session.favorites().len(), 2);
    }

    #[tokio::test]
    async fn fetching_a_non_favorite_leaves_favorites_alone() {
        let mut session = session(FakeProvider::default().with_current("London", 15).with_current("Paris", 12));
        session.add_favorite(conditions("Paris", 9)).unwrap();

        session.fetch_weather("London").await;

        assert_eq!(session.favorites(), &[conditions("Paris", 9)]);
    }

    #[tokio::test]
    async fn add_current_without_data_is_a_no_op() {
        let mut session = session(FakeProvider::default());
        assert!(!session.add_current_to_favorites().unwrap());
        assert!(session.favorites().is_empty());
    }

    #[tokio::test]
    async fn stale_responses_are_discarded() {
        let mut session = session(FakeProvider::default().with_current("London", 15).with_current("Paris", 12));

        let first = session.begin_request();
        let second = session.begin_request();
        let london = session.load(&session.resolver().resolve_by_name("London").unwrap()).await;
        let paris = session.load(&session.resolver().resolve_by_name("Paris").unwrap()).await;

        assert!(session.complete(second, paris));
        assert!(!session.complete(first, london));
        assert_eq!(session.current().unwrap().location, "Paris");
    }

    #[tokio::test]
    async fn stale_failure_does_not_clobber_newer_success() {
        let mut session = session(FakeProvider::default().with_current("Paris", 12));

        let first = session.begin_request();
        let second = session.begin_request();
        assert!(session.is_loading());

        let paris = session.load(&session.resolver().resolve_by_name("Paris").unwrap()).await;
        assert!(session.complete(second, paris));
        assert!(!session.complete(first, Err(WeatherError::LocationNotFound("city not found".into()))));

        assert_eq!(session.status(), SessionStatus::Loaded);
    }

    #[tokio::test]
    async fn superseded_request_keeps_loading_until_latest_completes() {
        let mut session = session(FakeProvider::default().with_current("Paris", 12));

        let first = session.begin_request();
        let second = session.begin_request();
        let paris = session.load(&session.resolver().resolve_by_name("Paris").unwrap()).await;

        assert!(!session.complete(first, paris));
        assert_eq!(session.status(), SessionStatus::Loading);

        let paris = session.load(&session.resolver().resolve_by_name("Paris").unwrap()).await;
        assert!(session.complete(second, paris));
        assert_eq!(session.status(), SessionStatus::Loaded);
    }

    #[tokio::test]
    async fn bootstrap_prefers_pending_selection_and_consumes_it() {
        let mut session = session(
            FakeProvider::default()
                .with_current("Lisbon", 20)
                .with_reverse(vec![place("London")])
                .with_current("London", 15),
        );
        let mut handoff = Handoff::new(MemoryStore::new());
        handoff.select("Lisbon").unwrap();

        let source = session.bootstrap(&FixedPosition(Coordinates::new(51.5, -0.12)), &mut handoff).await;

        assert_eq!(source, BootstrapSource::PendingSelection("Lisbon".into()));
        assert_eq!(session.current().unwrap().location, "Lisbon");
        assert_eq!(handoff.take().unwrap(), None);
        assert_eq!(session.provider().calls("reverse_geocode"), 0);
    }

    #[tokio::test]
    async fn bootstrap_uses_device_position() {
        let mut session = session(
            FakeProvider::default().with_reverse(vec![place("London")]).with_current("London", 15),
        );
        let mut handoff = Handoff::new(MemoryStore::new());
        let coords = Coordinates::new(51.5, -0.12);

        let source = session.bootstrap(&FixedPosition(coords), &mut handoff).await;

        assert_eq!(source, BootstrapSource::Geolocation(coords));
        assert_eq!(session.current().unwrap().location, "London");
    }

    #[tokio::test]
    async fn bootstrap_falls_back_to_default_when_sensor_denied() {
        let mut session =
            session(FakeProvider::default().with_current("Oslo", 2)).with_default_location("Oslo");
        let mut handoff = Handoff::new(MemoryStore::new());

        let source = session.bootstrap(&NoSensor, &mut handoff).await;

        assert_eq!(source, BootstrapSource::DefaultLocation("Oslo".into()));
        assert_eq!(session.status(), SessionStatus::Loaded);
    }

    #[tokio::test]
    async fn bootstrap_default_location_is_london() {
        let mut session = session(FakeProvider::default().with_current("London", 15));
        let mut handoff = Handoff::new(MemoryStore::new());

        let source = session.bootstrap(&NoSensor, &mut handoff).await;

        assert_eq!(source, BootstrapSource::DefaultLocation("London".into()));
    }

    #[tokio::test]
    async fn bootstrap_runs_once_and_respects_disabled_auto_location() {
        let mut session = session(FakeProvider::default().with_current("London", 15));
        let mut handoff = Handoff::new(MemoryStore::new());

        session.set_auto_location(false);
        assert_eq!(session.bootstrap(&NoSensor, &mut handoff).await, BootstrapSource::Skipped);
        assert_eq!(session.status(), SessionStatus::Idle);

        session.set_auto_location(true);
        assert!(matches!(
            session.bootstrap(&NoSensor, &mut handoff).await,
            BootstrapSource::DefaultLocation(_)
        ));

        session.set_auto_location(true);
        assert_eq!(session.bootstrap(&NoSensor, &mut handoff).await, BootstrapSource::Skipped);
        assert_eq!(session.provider().calls("current_by_name"), 1);
    }

    #[tokio::test]
    async fn pending_selection_is_honoured_after_bootstrap() {
        let mut session = session(FakeProvider::default().with_current("London", 15).with_current("Rome", 18));
        let mut handoff = Handoff::new(MemoryStore::new());
        session.bootstrap(&NoSensor, &mut handoff).await;

        handoff.select("Rome").unwrap();
        let source = session.bootstrap(&NoSensor, &mut handoff).await;

        assert_eq!(source, BootstrapSource::PendingSelection("Rome".into()));
        assert_eq!(session.current().unwrap().location, "Rome");
    }

    #[tokio::test]
    async fn fetch_disables_auto_location() {
        let mut session = session(FakeProvider::default().with_current("London", 15));
        assert!(session.auto_location());

        session.fetch_weather("London").await;

        assert!(!session.auto_location());
    }
}
