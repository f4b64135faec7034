use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::task::JoinSet;

use crate::{
    Config,
    model::{FetchKind, FetchPayload},
    persistence::PersistenceBridge,
    provider::{WeatherClient, client_from_config},
    store::CityWatchlistStore,
};

/// What a single intent ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Result recorded in the store.
    Stored,
    /// Failure recorded in the store.
    Failed,
    /// A request for the same city and kind was already in flight.
    AlreadyPending,
    /// The city was removed while the request was in flight.
    Discarded,
    /// The city is not on the watch-list.
    Untracked,
    AlreadyTracked,
    /// Blank city name.
    Ignored,
}

/// Outstanding requests keyed by (city, kind).
///
/// Each request holds a ticket; a response is only applied if its ticket is
/// still registered when it arrives.
#[derive(Debug, Default)]
struct InFlight {
    next_ticket: u64,
    tickets: HashMap<(String, FetchKind), u64>,
}

impl InFlight {
    fn begin(&mut self, city: &str, kind: FetchKind) -> Option<u64> {
        let key = (city.to_string(), kind);
        if self.tickets.contains_key(&key) {
            return None;
        }

        self.next_ticket += 1;
        self.tickets.insert(key, self.next_ticket);
        Some(self.next_ticket)
    }

    fn finish(&mut self, city: &str, kind: FetchKind, ticket: u64) -> bool {
        let key = (city.to_string(), kind);
        if self.tickets.get(&key) == Some(&ticket) {
            self.tickets.remove(&key);
            true
        } else {
            false
        }
    }

    fn forget_city(&mut self, city: &str) {
        self.tickets.retain(|(c, _), _| c != city);
    }
}

#[derive(Debug, Default)]
struct State {
    store: CityWatchlistStore,
    in_flight: InFlight,
    /// Bumped on every watch-list change.
    generation: u64,
}

impl State {
    fn watchlist_changed(&mut self) -> (u64, Vec<String>) {
        self.generation += 1;
        (self.generation, self.store.list_cities().to_vec())
    }
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    client: Arc<dyn WeatherClient>,
    persistence: PersistenceBridge,
    /// Generation of the last list written to storage.
    saved_generation: Mutex<u64>,
}

/// Releases a request's ticket if the request future is dropped before the
/// provider answers, so the city can be fetched again.
struct InFlightGuard<'a> {
    inner: &'a Inner,
    city: &'a str,
    kind: FetchKind,
    ticket: u64,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(mut self) -> u64 {
        self.armed = false;
        self.ticket
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let mut state = self.inner.state.lock();
        if state.in_flight.finish(self.city, self.kind, self.ticket) {
            state.store.record_fetch_abandoned(self.city, self.kind);
        }
    }
}

/// Entry point for dashboard intents.
///
/// Cloning is cheap; all clones share one store. The store lock is never held
/// across a provider request or a storage write.
#[derive(Debug, Clone)]
pub struct FetchCoordinator {
    inner: Arc<Inner>,
}

impl FetchCoordinator {
    pub fn new(
        store: CityWatchlistStore,
        client: Arc<dyn WeatherClient>,
        persistence: PersistenceBridge,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State { store, ..State::default() }),
                client,
                persistence,
                saved_generation: Mutex::new(0),
            }),
        }
    }

    /// OpenWeather client and file-backed watch-list, both from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = client_from_config(config)?;
        let persistence = PersistenceBridge::from_config(config)?;
        Ok(Self::new(CityWatchlistStore::new(), client, persistence))
    }

    /// Read-only access to the store.
    pub fn view<R>(&self, f: impl FnOnce(&CityWatchlistStore) -> R) -> R {
        f(&self.inner.state.lock().store)
    }

    pub fn dismiss_error(&self) {
        self.inner.state.lock().store.dismiss_error();
    }

    /// Tracks `name` and fetches its current weather.
    ///
    /// A city whose fetch fails stays on the watch-list in `Failed` status.
    pub async fn add_city(&self, name: &str) -> FetchOutcome {
        if name.trim().is_empty() {
            return FetchOutcome::Ignored;
        }

        let (generation, cities) = {
            let mut state = self.inner.state.lock();
            if !state.store.add_city(name) {
                return FetchOutcome::AlreadyTracked;
            }
            state.watchlist_changed()
        };

        tracing::info!(city = name, "city added");
        self.persist(generation, cities).await;
        self.fetch(name, FetchKind::Current).await
    }

    pub async fn remove_city(&self, name: &str) -> bool {
        let (generation, cities) = {
            let mut state = self.inner.state.lock();
            if !state.store.remove_city(name) {
                return false;
            }
            state.in_flight.forget_city(name);
            state.watchlist_changed()
        };

        tracing::info!(city = name, "city removed");
        self.persist(generation, cities).await;
        true
    }

    pub async fn refresh(&self, city: &str) -> FetchOutcome {
        self.fetch(city, FetchKind::Current).await
    }

    /// Refreshes every tracked city concurrently.
    pub async fn refresh_all(&self) -> Vec<(String, FetchOutcome)> {
        let cities = self.view(|store| store.list_cities().to_vec());
        self.refresh_each(cities).await
    }

    /// Loads the detail view: hourly forecast, preceded by current weather
    /// when the city has no snapshot yet.
    pub async fn open_detail(&self, city: &str) -> FetchOutcome {
        let has_current = {
            let state = self.inner.state.lock();
            if !state.store.contains(city) {
                return FetchOutcome::Untracked;
            }
            state.store.snapshot_for(city).is_some()
        };

        if !has_current {
            let outcome = self.fetch(city, FetchKind::Current).await;
            if outcome != FetchOutcome::Stored {
                return outcome;
            }
        }

        self.fetch(city, FetchKind::Hourly).await
    }

    /// Seeds the watch-list from storage and fetches each newly added city.
    /// Blank names are skipped, as in [`FetchCoordinator::add_city`].
    pub async fn restore(&self) -> Vec<(String, FetchOutcome)> {
        let restored = self.inner.persistence.load_tracked_city_ids();

        let (added, changed) = {
            let mut state = self.inner.state.lock();
            let added: Vec<String> = restored
                .into_iter()
                .filter(|city| !city.trim().is_empty() && state.store.add_city(city))
                .collect();
            let changed = (!added.is_empty()).then(|| state.watchlist_changed());
            (added, changed)
        };

        if let Some((generation, cities)) = changed {
            self.persist(generation, cities).await;
        }

        tracing::info!(cities = added.len(), "watch-list restored");
        self.refresh_each(added).await
    }

    /// Writes the watch-list off the async workers. A snapshot older than
    /// the last one written is skipped.
    async fn persist(&self, generation: u64, cities: Vec<String>) {
        let inner = Arc::clone(&self.inner);
        let written = tokio::task::spawn_blocking(move || {
            let mut saved = inner.saved_generation.lock();
            if generation > *saved {
                inner.persistence.save_tracked_city_ids(&cities);
                *saved = generation;
            }
        })
        .await;

        if let Err(e) = written {
            tracing::warn!(error = %e, "watch-list write task did not complete");
        }
    }

    async fn refresh_each(&self, cities: Vec<String>) -> Vec<(String, FetchOutcome)> {
        let mut tasks = JoinSet::new();
        for city in cities {
            let this = self.clone();
            tasks.spawn(async move {
                let outcome = this.refresh(&city).await;
                (city, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => outcomes.push(result),
                Err(e) => tracing::warn!(error = %e, "refresh task did not complete"),
            }
        }
        outcomes
    }

    async fn fetch(&self, city: &str, kind: FetchKind) -> FetchOutcome {
        let guard = {
            let mut state = self.inner.state.lock();
            if !state.store.contains(city) {
                return FetchOutcome::Untracked;
            }
            let Some(ticket) = state.in_flight.begin(city, kind) else {
                tracing::debug!(city, %kind, "request already in flight");
                return FetchOutcome::AlreadyPending;
            };
            state.store.record_fetch_pending(city, kind);
            InFlightGuard { inner: &self.inner, city, kind, ticket, armed: true }
        };

        let result = match kind {
            FetchKind::Current => {
                self.inner.client.fetch_current(city).await.map(FetchPayload::Current)
            }
            FetchKind::Hourly => {
                self.inner.client.fetch_hourly(city).await.map(FetchPayload::Hourly)
            }
        };

        let ticket = guard.disarm();
        let mut state = self.inner.state.lock();
        if !state.in_flight.finish(city, kind, ticket) || !state.store.contains(city) {
            tracing::debug!(city, %kind, "discarding response for removed city");
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(payload) => {
                state.store.record_fetch_succeeded(city, payload);
                FetchOutcome::Stored
            }
            Err(e) => {
                tracing::warn!(city, %kind, error = %e, "weather request failed");
                state.store.record_fetch_failed(city, kind, &e.user_message());
                FetchOutcome::Failed
            }
        }
    }
}
