//! Persisted, order-preserving list of saved locations.

use crate::{
    error::{Result, WeatherError},
    model::CurrentConditions,
    store::KeyValueStore,
};

pub const FAVORITES_KEY: &str = "favorites";

/// Owns the favorites sequence and writes it back after every mutation.
///
/// The in-memory list is the source of truth; when a write fails the
/// mutation still stands and the error is returned to the caller.
#[derive(Debug)]
pub struct FavoritesStore<S: KeyValueStore> {
    store: S,
    entries: Vec<CurrentConditions>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Read the persisted sequence. Absent, unreadable or unparsable records
    /// start an empty list.
    pub fn load(store: S) -> Self {
        let entries = match read_entries(&store) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring unusable favorites record");
                Vec::new()
            }
        };
        tracing::debug!(count = entries.len(), "Loaded favorites");

        Self { store, entries }
    }

    pub fn entries(&self) -> &[CurrentConditions] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, location: &str) -> bool {
        self.entries.iter().any(|e| e.location == location)
    }

    /// Append without a duplicate check.
    pub fn add(&mut self, entry: CurrentConditions) -> Result<()> {
        tracing::info!(location = %entry.location, "Adding favorite");
        self.entries.push(entry);
        self.persist()
    }

    /// Drop every entry whose location is exactly `location`.
    pub fn remove(&mut self, location: &str) -> Result<()> {
        let before = self.entries.len();
        self.entries.retain(|e| e.location != location);
        tracing::info!(location, removed = before - self.entries.len(), "Removed favorite");
        self.persist()
    }

    /// Replace every entry sharing `updated.location` with `updated`.
    pub fn reconcile(&mut self, updated: &CurrentConditions) -> Result<()> {
        for entry in self.entries.iter_mut().filter(|e| e.location == updated.location) {
            *entry = updated.clone();
        }
        self.persist()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.entries)
            .map_err(|err| WeatherError::Persist(format!("failed to serialize favorites: {err}")))?;
        self.store.set(FAVORITES_KEY, &json)
    }
}

fn read_entries<S: KeyValueStore>(store: &S) -> Result<Vec<CurrentConditions>> {
    match store.get(FAVORITES_KEY)? {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|err| WeatherError::MalformedPersistedState(err.to_string())),
        None => Ok(Vec::new()),
    }
}
