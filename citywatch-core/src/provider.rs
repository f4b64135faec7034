use crate::{
    Config,
    error::WeatherError,
    model::{HourlyForecastSnapshot, WeatherSnapshot},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// The two requests the dashboard makes against a weather provider.
///
/// Implementations make a single attempt per call and keep no cache.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError>;

    async fn fetch_hourly(&self, city: &str) -> Result<HourlyForecastSnapshot, WeatherError>;
}

/// Construct the OpenWeather client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherClient>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for the weather provider.\n\
                 Hint: set `api_key` in {}.",
            Config::config_file_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "config.toml".to_string())
        )
    })?;

    let client = OpenWeatherClient::from_config(api_key.to_owned(), config)?;
    Ok(Arc::new(client))
}
