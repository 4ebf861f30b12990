//! Pending location selection carried from the favorites view to the next
//! weather bootstrap.

use crate::{error::Result, store::KeyValueStore};

pub const SELECTED_LOCATION_KEY: &str = "selected_location";

#[derive(Debug)]
pub struct Handoff<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Handoff<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record `location` as the next location to show, replacing any earlier one.
    pub fn select(&mut self, location: &str) -> Result<()> {
        self.store.set(SELECTED_LOCATION_KEY, location)
    }

    /// Read and delete the pending selection.
    pub fn take(&mut self) -> Result<Option<String>> {
        let pending = self.store.get(SELECTED_LOCATION_KEY)?;
        if pending.is_some() {
            self.store.remove(SELECTED_LOCATION_KEY)?;
        }
        Ok(pending.filter(|name| !name.trim().is_empty()))
    }
}
