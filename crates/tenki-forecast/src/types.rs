use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stands in for a missing weather, wind or icon entry
pub const PLACEHOLDER: &str = "-";

/// Stands in for a missing temperature
pub const TEMP_PLACEHOLDER: &str = "データ未取得";

/// A forecast area from the JMA region catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub code: String,
    pub name: String,
}

/// Flat forecast for one region and day.
///
/// Temperatures stay as strings: the API delivers them as text and a
/// missing value is replaced by [`TEMP_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub region_code: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub weather: String,
    /// JMA icon code, e.g. `"100"`
    pub weather_code: String,
    pub wind: String,
    pub max_temp: String,
    pub min_temp: String,
}

impl ForecastRecord {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_description(&self.weather)
    }

    /// Icon image URL, or `None` when the icon code is missing.
    pub fn icon_url(&self, icon_url_base: &str) -> Option<String> {
        if self.weather_code.is_empty() || self.weather_code == PLACEHOLDER {
            return None;
        }
        Some(format!(
            "{}/{}.png",
            icon_url_base.trim_end_matches('/'),
            self.weather_code
        ))
    }

    pub fn has_temperatures(&self) -> bool {
        self.max_temp != TEMP_PLACEHOLDER && self.min_temp != TEMP_PLACEHOLDER
    }
}

/// A forecast row read back from the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedForecast {
    pub record: ForecastRecord,
    pub fetched_at: DateTime<Utc>,
}

impl CachedForecast {
    /// A row is stale once `ttl` has elapsed since it was fetched.
    /// A zero TTL makes every row stale.
    pub fn is_stale(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.fetched_at >= ttl
    }
}

/// Coarse weather categories derived from the Japanese description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Sunny,
    Rain,
    Cloudy,
    Snow,
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// Classify a JMA weather description such as `"晴れ 時々 くもり"`.
    ///
    /// The first matching kanji wins, checked in the order 晴, 雨, 曇, 雪.
    pub fn from_description(description: &str) -> Self {
        if description.contains('晴') {
            Self::Sunny
        } else if description.contains('雨') {
            Self::Rain
        } else if description.contains('曇') || description.contains("くもり") {
            Self::Cloudy
        } else if description.contains('雪') {
            Self::Snow
        } else {
            Self::Unknown
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Sunny => "sun",
            Self::Rain => "umbrella",
            Self::Cloudy => "cloud",
            Self::Snow => "snowflake",
            Self::Unknown => "help",
        }
    }

    /// Single glyph for terminal cards
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Sunny => "☀",
            Self::Rain => "☂",
            Self::Cloudy => "☁",
            Self::Snow => "❄",
            Self::Unknown => "?",
        }
    }
}

/// `area.json` as served by JMA. Only `offices` is read.
#[derive(Debug, Deserialize)]
pub(crate) struct AreaCatalog {
    #[serde(default)]
    pub offices: BTreeMap<String, OfficeEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OfficeEntry {
    pub name: String,
}

impl AreaCatalog {
    pub(crate) fn into_regions(self) -> Vec<Region> {
        self.offices
            .into_iter()
            .map(|(code, office)| Region {
                code,
                name: office.name,
            })
            .collect()
    }
}
