use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of forecast points kept per city.
pub const HOURLY_POINTS: usize = 12;

/// Current conditions for a tracked city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub description: String,
    pub icon: String,
    /// Temperature as reported by the provider, in the configured units.
    pub temperature: f64,
    pub condition_id: u32,
}

impl WeatherSnapshot {
    /// Icon image URL, e.g. `https://openweathermap.org/img/wn/01d@2x.png`.
    pub fn icon_url(&self, icon_base_url: &str) -> String {
        format!("{}/{}@2x.png", icon_base_url.trim_end_matches('/'), self.icon)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub timestamp: DateTime<Utc>,
    /// Hour of day in the city's local time, e.g. `"15:00"`.
    pub hour_label: String,
    pub temperature: i32,
}

/// Chronological forecast points, at most [`HOURLY_POINTS`] of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyForecastSnapshot {
    pub points: Vec<HourlyPoint>,
}

impl HourlyForecastSnapshot {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchKind {
    Current,
    Hourly,
}

impl FetchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchKind::Current => "current",
            FetchKind::Hourly => "hourly",
        }
    }
}

impl std::fmt::Display for FetchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Failed,
}

impl FetchStatus {
    pub fn is_loading(self) -> bool {
        matches!(self, FetchStatus::Loading)
    }
}

/// A successful fetch result, tagged by the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchPayload {
    Current(WeatherSnapshot),
    Hourly(HourlyForecastSnapshot),
}

impl FetchPayload {
    pub fn kind(&self) -> FetchKind {
        match self {
            FetchPayload::Current(_) => FetchKind::Current,
            FetchPayload::Hourly(_) => FetchKind::Hourly,
        }
    }
}

/// One row of the dashboard, in watch-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct CityCard<'a> {
    pub name: &'a str,
    pub snapshot: Option<&'a WeatherSnapshot>,
    pub status: FetchStatus,
}
