//! Forecast-specific error types.

use tenki_core::error::{ReqwestErrorExt, RusqliteErrorExt};
use tenki_core::{AppError, NetworkError};
use thiserror::Error;

pub type ForecastResult<T> = std::result::Result<T, ForecastError>;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForecastError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Http { status: 404, .. } => "No forecast exists for that region code.".to_string(),
            Self::Http { status, .. } => format!("Forecast service returned HTTP {}", status),
            Self::Parse(_) => "The forecast service returned unexpected data.".to_string(),
            Self::Cache(_) | Self::Io(_) => "Local cache error".to_string(),
        }
    }

    /// Whether the server said the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::Network(e) => AppError::Network(e.into_network_error()),
            ForecastError::Http { status, url } => AppError::Network(NetworkError::ServerError {
                status,
                message: url,
            }),
            ForecastError::Parse(msg) => AppError::InvalidData(msg),
            ForecastError::Cache(e) => AppError::Database(e.into_database_error()),
            ForecastError::Io(e) => AppError::Io(e),
        }
    }
}
