//! Scripted weather client shared by the coordinator tests.

#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use citywatch_core::{
    CityWatchlistStore, FetchCoordinator, FetchKind, HourlyForecastSnapshot, HourlyPoint,
    MemoryStore, PersistenceBridge, WeatherClient, WeatherError, WeatherSnapshot,
    config::default_cities,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

pub fn clear_sky(temperature: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        description: "clear sky".into(),
        icon: "01d".into(),
        temperature,
        condition_id: 800,
    }
}

pub fn two_hours() -> HourlyForecastSnapshot {
    HourlyForecastSnapshot {
        points: vec![
            HourlyPoint {
                timestamp: chrono::DateTime::from_timestamp(1_234_567_890, 0).unwrap(),
                hour_label: "23:00".into(),
                temperature: 25,
            },
            HourlyPoint {
                timestamp: chrono::DateTime::from_timestamp(1_234_571_490, 0).unwrap(),
                hour_label: "0:00".into(),
                temperature: 26,
            },
        ],
    }
}

/// Answers from a fixed table; unknown cities are `NotFound`.
///
/// When gated, every request waits for a permit from [`MockClient::release`].
#[derive(Debug, Default)]
pub struct MockClient {
    current: Mutex<HashMap<String, WeatherSnapshot>>,
    calls: Mutex<Vec<(String, FetchKind)>>,
    gate: Option<Semaphore>,
    pub started: Notify,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self { gate: Some(Semaphore::new(0)), ..Self::default() }
    }

    pub fn with_current(self, city: &str, snapshot: WeatherSnapshot) -> Self {
        self.current.lock().insert(city.to_string(), snapshot);
        self
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn calls(&self) -> Vec<(String, FetchKind)> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, city: &str, kind: FetchKind) -> usize {
        self.calls.lock().iter().filter(|(c, k)| c == city && *k == kind).count()
    }

    async fn enter(&self, city: &str, kind: FetchKind) {
        self.calls.lock().push((city.to_string(), kind));
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
    }
}

#[async_trait]
impl WeatherClient for MockClient {
    async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        self.enter(city, FetchKind::Current).await;
        let found = self.current.lock().get(city).cloned();
        found.ok_or_else(|| WeatherError::NotFound(city.to_string()))
    }

    async fn fetch_hourly(&self, city: &str) -> Result<HourlyForecastSnapshot, WeatherError> {
        self.enter(city, FetchKind::Hourly).await;
        let known = self.current.lock().contains_key(city);
        if known { Ok(two_hours()) } else { Err(WeatherError::NotFound(city.to_string())) }
    }
}

/// Coordinator over in-memory storage with `cities` already tracked.
pub fn coordinator_with(client: Arc<MockClient>, cities: &[&str]) -> FetchCoordinator {
    let mut store = CityWatchlistStore::new();
    for city in cities {
        store.add_city(city);
    }

    let persistence = PersistenceBridge::new(Box::new(MemoryStore::new()), default_cities());
    FetchCoordinator::new(store, client, persistence)
}
