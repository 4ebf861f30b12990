use std::{io::Write, sync::Arc};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Text};
use nimbus_core::{
    BootstrapSource, Config, Coordinates, FavoritesStore, FileStore, Handoff, OpenWeatherProvider,
    Place, SessionStatus, SuggestionDebouncer, Suggestions, WeatherSession,
    geolocation::geolocator_for,
    provider::provider_from_config,
    suggest::DEFAULT_QUIET_PERIOD,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::render;

type Session = WeatherSession<OpenWeatherProvider, FileStore>;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "nimbus", version, about = "Current weather and forecasts for your favorite places")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, default location and home coordinates.
    Configure,

    /// Show current weather and forecast.
    ///
    /// Without a location or coordinates, shows the pending favorite selection,
    /// then the home position, then the default location.
    Show {
        /// Location name, e.g. "Paris" or "Paris,FR".
        location: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true, conflicts_with = "location")]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Add the result to favorites.
        #[arg(long)]
        save: bool,

        /// Skip the home position and go straight to the default location.
        #[arg(long)]
        no_auto_location: bool,
    },

    /// Manage favorite locations.
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },

    /// Type location names line by line and get suggestions; enter a
    /// suggestion's number to show its weather.
    Search,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// List saved locations with their last known conditions.
    List,

    /// Fetch a location and save it.
    Add { location: String },

    /// Remove every entry for a location.
    Remove { location: String },

    /// Make the next `nimbus show` open this location.
    Open { location: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location, lat, lon, save, no_auto_location } => {
                let coords = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                show(location, coords, save, no_auto_location).await
            }
            Command::Favorites { action } => favorites(action).await,
            Command::Search => search().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key);

    let default_location = Text::new("Default location:")
        .with_default(config.default_location())
        .prompt()?;
    config.default_location = Some(default_location);

    let set_home = Confirm::new("Set home coordinates for automatic location?")
        .with_default(config.home.is_some())
        .prompt()?;
    config.home = if set_home {
        let lat = CustomType::<f64>::new("Latitude:").prompt()?;
        let lon = CustomType::<f64>::new("Longitude:").prompt()?;
        let coords = Coordinates::new(lat, lon);
        if !coords.is_valid() {
            bail!("Coordinates out of range: {lat}, {lon}");
        }
        Some(coords)
    } else {
        None
    };

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

fn open_session(config: &Config) -> anyhow::Result<Session> {
    let provider = provider_from_config(config)?;
    let favorites = FavoritesStore::load(FileStore::new(Config::data_dir()?));

    Ok(WeatherSession::new(provider, favorites, chrono::Local)
        .with_default_location(config.default_location())
        .with_auto_location(config.auto_location))
}

fn open_handoff() -> anyhow::Result<Handoff<FileStore>> {
    Ok(Handoff::new(FileStore::new(Config::cache_dir()?)))
}

async fn show(
    location: Option<String>,
    coords: Option<Coordinates>,
    save: bool,
    no_auto_location: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let mut session = open_session(&config)?;

    match (location, coords) {
        (Some(location), _) => {
            session.fetch_weather(&location).await;
        }
        (None, Some(coords)) => {
            session.fetch_by_coordinates(coords).await;
        }
        (None, None) => {
            if no_auto_location {
                session.set_auto_location(false);
            }
            let geolocator = geolocator_for(config.home);
            let mut handoff = open_handoff()?;
            let source = session.bootstrap(geolocator.as_ref(), &mut handoff).await;
            tracing::debug!(?source, "Bootstrapped location");

            if source == BootstrapSource::Skipped {
                // auto location off: fall through to the default location
                let default = config.default_location().to_string();
                session.fetch_weather(&default).await;
            }
        }
    }

    finish(&mut session, save)
}

fn finish(session: &mut Session, save: bool) -> anyhow::Result<()> {
    if session.status() == SessionStatus::Failed {
        bail!("{}", session.error().unwrap_or("Failed to fetch weather data"));
    }

    let favorite = session.current().is_some_and(|c| session.is_favorite(&c.location));
    print!("{}", render::report(session.state(), favorite));

    if save && session.add_current_to_favorites().context("Failed to save favorite")? {
        println!("Saved to favorites.");
    }

    Ok(())
}

async fn favorites(action: FavoritesCommand) -> anyhow::Result<()> {
    match action {
        FavoritesCommand::List => {
            let favorites = FavoritesStore::load(FileStore::new(Config::data_dir()?));
            print!("{}", render::favorites(favorites.entries()));
        }
        FavoritesCommand::Add { location } => {
            let config = Config::load()?;
            let mut session = open_session(&config)?;
            session.fetch_weather(&location).await;
            finish(&mut session, true)?;
        }
        FavoritesCommand::Remove { location } => {
            let mut favorites = FavoritesStore::load(FileStore::new(Config::data_dir()?));
            if !favorites.contains(&location) {
                println!("'{location}' is not a favorite.");
                return Ok(());
            }
            favorites.remove(&location).context("Failed to update favorites")?;
            println!("Removed '{location}'.");
        }
        FavoritesCommand::Open { location } => {
            open_handoff()?.select(&location).context("Failed to store selection")?;
            println!("Run `nimbus show` to open '{location}'.");
        }
    }

    Ok(())
}

async fn search() -> anyhow::Result<()> {
    let config = Config::load()?;
    let provider = Arc::new(provider_from_config(&config)?);
    let mut debouncer = SuggestionDebouncer::spawn(provider, DEFAULT_QUIET_PERIOD);

    println!("Type a location and press enter; enter a number to open a suggestion; Ctrl-D to quit.");

    let input = BufReader::new(tokio::io::stdin());
    let picked = read_queries(&mut debouncer, input, &mut std::io::stdout()).await?;
    drop(debouncer);

    if let Some(place) = picked {
        let mut session = open_session(&config)?;
        session.fetch_weather(&place.name).await;
        finish(&mut session, false)?;
    }

    Ok(())
}

/// Feed input lines to `debouncer` and print each batch of suggestions.
///
/// A line holding the number of a printed suggestion selects it. At end of
/// input the last pending query is still looked up and printed.
async fn read_queries<R, W>(
    debouncer: &mut SuggestionDebouncer,
    input: R,
    out: &mut W,
) -> anyhow::Result<Option<Place>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut shown = Suggestions::default();

    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("Failed to read stdin")? {
                Some(line) => {
                    if let Some(place) = pick(&shown, &line) {
                        return Ok(Some(place));
                    }
                    debouncer.push(line);
                }
                None => break,
            },
            suggestions = debouncer.next() => match suggestions {
                Some(suggestions) => {
                    write!(out, "{}", render::suggestions(&suggestions))?;
                    shown = suggestions;
                }
                None => return Ok(None),
            },
        }
    }

    debouncer.close();
    while let Some(suggestions) = debouncer.next().await {
        write!(out, "{}", render::suggestions(&suggestions))?;
    }

    Ok(None)
}

/// The place numbered `line` in the last printed list, counting from 1.
fn pick(shown: &Suggestions, line: &str) -> Option<Place> {
    let n: usize = line.trim().parse().ok()?;
    shown.places.get(n.checked_sub(1)?).cloned()
}
