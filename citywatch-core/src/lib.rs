//! Core library for the city weather dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - The weather provider client and its typed errors
//! - The watch-list store and its persistence
//! - The fetch coordinator that turns user intents into provider requests
//!
//! It has no UI of its own; a dashboard shell embeds a [`FetchCoordinator`],
//! reads state through [`FetchCoordinator::view`] and forwards user intents to it.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod persistence;
pub mod provider;
pub mod store;

pub use config::Config;
pub use coordinator::{FetchCoordinator, FetchOutcome};
pub use error::{PersistenceError, StorageError, WeatherError};
pub use model::{
    CityCard, FetchKind, FetchPayload, FetchStatus, HourlyForecastSnapshot, HourlyPoint,
    WeatherSnapshot,
};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, PersistenceBridge};
pub use provider::{WeatherClient, client_from_config, openweather::OpenWeatherClient};
pub use store::CityWatchlistStore;
