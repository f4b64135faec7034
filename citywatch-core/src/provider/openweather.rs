use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    config::{Config, DEFAULT_BASE_URL},
    error::WeatherError,
    model::{HOURLY_POINTS, HourlyForecastSnapshot, HourlyPoint, WeatherSnapshot},
};

use super::WeatherClient;

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    units: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            units: "metric".to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(api_key: String, config: &Config) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            units: config.units.clone(),
            http,
        })
    }

    /// Point the client at another provider root (a proxy or a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &str,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound(city.to_string()));
        }

        if !status.is_success() {
            return Err(WeatherError::Provider {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::Provider {
            status: status.as_u16(),
            message: format!("Failed to parse OpenWeather {endpoint} JSON: {e}"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u32,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    /// Shift from UTC in seconds.
    #[serde(default)]
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    city: Option<OwCity>,
    list: Vec<OwForecastEntry>,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, WeatherError> {
        let condition = self.weather.into_iter().next().ok_or_else(|| WeatherError::Provider {
            status: StatusCode::OK.as_u16(),
            message: "OpenWeather response contained no weather conditions".to_string(),
        })?;

        Ok(WeatherSnapshot {
            description: condition.description,
            icon: condition.icon,
            temperature: self.main.temp,
            condition_id: condition.id,
        })
    }
}

impl OwForecastResponse {
    fn into_snapshot(self) -> Result<HourlyForecastSnapshot, WeatherError> {
        let offset = self
            .city
            .and_then(|c| c.timezone)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        let points = self
            .list
            .into_iter()
            .take(HOURLY_POINTS)
            .map(|entry| {
                let timestamp = unix_to_utc(entry.dt).ok_or_else(|| WeatherError::Provider {
                    status: StatusCode::OK.as_u16(),
                    message: format!("OpenWeather forecast has invalid timestamp {}", entry.dt),
                })?;

                Ok(HourlyPoint {
                    timestamp,
                    hour_label: format!("{}:00", timestamp.with_timezone(&offset).hour()),
                    temperature: entry.main.temp.round() as i32,
                })
            })
            .collect::<Result<Vec<_>, WeatherError>>()?;

        Ok(HourlyForecastSnapshot { points })
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let parsed: OwCurrentResponse = self.get_json("weather", city).await?;
        parsed.into_snapshot()
    }

    async fn fetch_hourly(&self, city: &str) -> Result<HourlyForecastSnapshot, WeatherError> {
        let parsed: OwForecastResponse = self.get_json("forecast", city).await?;
        parsed.into_snapshot()
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
