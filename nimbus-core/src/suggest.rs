//! Debounced location autocomplete.
//!
//! Every pushed input restarts the quiet-period timer; only the input still
//! pending when the timer fires is looked up.

use std::time::Duration;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{model::Place, provider::WeatherProvider, resolver::LocationResolver};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Places suggested for `query`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestions {
    pub query: String,
    pub places: Vec<Place>,
}

#[derive(Debug)]
pub struct SuggestionDebouncer {
    input: Option<mpsc::UnboundedSender<String>>,
    results: watch::Receiver<Suggestions>,
    task: JoinHandle<()>,
}

impl SuggestionDebouncer {
    /// Start the coalescing task on the current tokio runtime.
    pub fn spawn<P>(provider: P, quiet_period: Duration) -> Self
    where
        P: WeatherProvider + 'static,
    {
        let (input, rx) = mpsc::unbounded_channel();
        let (tx, results) = watch::channel(Suggestions::default());
        let task = tokio::spawn(run(provider, quiet_period, rx, tx));

        Self { input: Some(input), results, task }
    }

    /// Queue a new input. Returns `false` once the input is closed or the
    /// task has stopped.
    pub fn push(&self, input: impl Into<String>) -> bool {
        self.input.as_ref().is_some_and(|tx| tx.send(input.into()).is_ok())
    }

    /// Stop accepting input. A still-pending input is looked up right away,
    /// published, and then the task exits.
    pub fn close(&mut self) {
        self.input = None;
    }

    /// Wait for the next published set of suggestions. Returns `None` once
    /// the task has exited and every result has been seen.
    pub async fn next(&mut self) -> Option<Suggestions> {
        self.results.changed().await.ok()?;
        Some(self.results.borrow_and_update().clone())
    }

    /// Latest published suggestions without waiting.
    pub fn latest(&self) -> Suggestions {
        self.results.borrow().clone()
    }
}

impl Drop for SuggestionDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<P: WeatherProvider>(
    provider: P,
    quiet_period: Duration,
    mut rx: mpsc::UnboundedReceiver<String>,
    tx: watch::Sender<Suggestions>,
) {
    let resolver = LocationResolver::new(&provider);

    while let Some(mut pending) = rx.recv().await {
        let mut closed = false;
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(input) => pending = input,
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = tokio::time::sleep(quiet_period) => break,
            }
        }

        let places = match resolver.suggest(&pending).await {
            Ok(places) => places,
            Err(err) => {
                tracing::warn!(error = %err, query = %pending, "Suggestion lookup failed");
                Vec::new()
            }
        };

        if tx.send(Suggestions { query: pending, places }).is_err() || closed {
            break;
        }
    }
}
