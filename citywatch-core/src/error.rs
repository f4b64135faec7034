//! Error types for provider requests and watch-list persistence.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("City not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider request failed with status {status}: {message}")]
    Provider { status: u16, message: String },
}

impl WeatherError {
    /// Message shown in the dashboard's error notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(city) => format!("City \"{city}\" not found"),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Provider { status: 401, .. } => {
                "Weather provider rejected the API key".to_string()
            }
            Self::Provider { status, .. } => format!("Weather provider error ({status})"),
        }
    }
}

/// Failure of the underlying key-value storage.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine platform data directory")]
    Unavailable,
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Persisted city list is malformed: {0}")]
    MalformedPersistedData(#[from] serde_json::Error),
}
