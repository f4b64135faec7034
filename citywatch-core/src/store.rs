use std::collections::HashMap;

use crate::model::{
    CityCard, FetchKind, FetchPayload, FetchStatus, HourlyForecastSnapshot, WeatherSnapshot,
};

/// Watch-list state: tracked cities, their snapshots and fetch status, and
/// the most recent error.
///
/// Every tracked city has exactly one status entry and nothing is kept for a
/// city that is not tracked. The `record_*` operations ignore untracked
/// cities, so a fetch that resolves after its city was removed leaves no
/// trace.
#[derive(Debug, Clone, Default)]
pub struct CityWatchlistStore {
    cities: Vec<String>,
    weather: HashMap<String, WeatherSnapshot>,
    hourly: HashMap<String, HourlyForecastSnapshot>,
    status: HashMap<String, FetchStatus>,
    last_error: Option<String>,
}

impl CityWatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` to the end of the watch-list. Returns `false` if it was already tracked.
    pub fn add_city(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }

        self.cities.push(name.to_string());
        self.status.insert(name.to_string(), FetchStatus::Idle);
        true
    }

    /// Removes `name` together with its snapshots and status.
    pub fn remove_city(&mut self, name: &str) -> bool {
        let before = self.cities.len();
        self.cities.retain(|c| c != name);

        self.weather.remove(name);
        self.hourly.remove(name);
        self.status.remove(name);

        self.cities.len() != before
    }

    pub fn record_fetch_pending(&mut self, city: &str, kind: FetchKind) -> bool {
        let Some(status) = self.status.get_mut(city) else {
            return false;
        };

        tracing::debug!(city, %kind, "fetch pending");
        *status = FetchStatus::Loading;
        self.last_error = None;
        true
    }

    pub fn record_fetch_succeeded(&mut self, city: &str, payload: FetchPayload) -> bool {
        let Some(status) = self.status.get_mut(city) else {
            return false;
        };

        tracing::debug!(city, kind = %payload.kind(), "fetch succeeded");
        *status = FetchStatus::Idle;
        match payload {
            FetchPayload::Current(snapshot) => {
                self.weather.insert(city.to_string(), snapshot);
            }
            FetchPayload::Hourly(snapshot) => {
                self.hourly.insert(city.to_string(), snapshot);
            }
        }
        true
    }

    pub fn record_fetch_failed(&mut self, city: &str, kind: FetchKind, message: &str) -> bool {
        let Some(status) = self.status.get_mut(city) else {
            return false;
        };

        tracing::debug!(city, %kind, error = message, "fetch failed");
        *status = FetchStatus::Failed;
        self.last_error = Some(message.to_string());
        true
    }

    /// A request was dropped before it resolved; a city left `Loading` goes back to `Idle`.
    pub fn record_fetch_abandoned(&mut self, city: &str, kind: FetchKind) -> bool {
        let Some(status) = self.status.get_mut(city) else {
            return false;
        };

        tracing::debug!(city, %kind, "fetch abandoned");
        if status.is_loading() {
            *status = FetchStatus::Idle;
        }
        true
    }

    /// Clears the error notification without touching any city's status.
    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn list_cities(&self) -> &[String] {
        &self.cities
    }

    pub fn contains(&self, city: &str) -> bool {
        self.status.contains_key(city)
    }

    pub fn snapshot_for(&self, city: &str) -> Option<&WeatherSnapshot> {
        self.weather.get(city)
    }

    pub fn hourly_for(&self, city: &str) -> Option<&HourlyForecastSnapshot> {
        self.hourly.get(city)
    }

    pub fn status_for(&self, city: &str) -> Option<FetchStatus> {
        self.status.get(city).copied()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Dashboard rows in watch-list order.
    pub fn cards(&self) -> Vec<CityCard<'_>> {
        self.cities
            .iter()
            .map(|name| CityCard {
                name: name.as_str(),
                snapshot: self.weather.get(name),
                status: self.status.get(name).copied().unwrap_or_default(),
            })
            .collect()
    }
}
