use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_AREA_URL: &str = "http://www.jma.go.jp/bosai/common/const/area.json";
pub const DEFAULT_FORECAST_URL_BASE: &str = "https://www.jma.go.jp/bosai/forecast/data/forecast";
pub const DEFAULT_ICON_URL_BASE: &str = "https://www.jma.go.jp/bosai/forecast/img";
pub const DEFAULT_DB_FILE: &str = "weather.db";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml and the cache database
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// JMA endpoints
    #[serde(default)]
    pub api: ApiConfig,

    /// Local forecast cache
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Region catalog (`{"offices": {code: {name}}}`)
    pub area_url: String,

    /// Forecast documents live at `{forecast_url_base}/{code}.json`
    pub forecast_url_base: String,

    /// Weather icons live at `{icon_url_base}/{weather_code}.png`
    pub icon_url_base: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            area_url: DEFAULT_AREA_URL.to_string(),
            forecast_url_base: DEFAULT_FORECAST_URL_BASE.to_string(),
            icon_url_base: DEFAULT_ICON_URL_BASE.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// SQLite file name, relative to `config_dir` unless absolute
    #[serde(default = "default_db_file")]
    pub db_file: String,

    /// Minutes before a cached forecast is considered stale.
    /// 0 refetches on every read.
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u32,
}

fn default_db_file() -> String {
    DEFAULT_DB_FILE.to_string()
}

fn default_cache_ttl_minutes() -> u32 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_file: default_db_file(),
            cache_ttl_minutes: default_cache_ttl_minutes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            api: ApiConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tenki")
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::Io(format!("Failed to read {}: {}", config_path.display(), e))
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration and validate it
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        Self::load()?.into_validated()
    }

    /// Fails with [`ConfigError::Invalid`] on validation errors.
    /// Warnings are logged and returned.
    pub fn into_validated(self) -> Result<(Self, ValidationResult), ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.api.area_url, "api.area_url", &mut result);
        self.validate_url(
            &self.api.forecast_url_base,
            "api.forecast_url_base",
            &mut result,
        );
        self.validate_url(&self.api.icon_url_base, "api.icon_url_base", &mut result);

        if self.api.timeout_secs == 0 {
            result.add_error("api.timeout_secs", "Timeout must be greater than 0");
        }

        if self.cache.db_file.trim().is_empty() {
            result.add_error("cache.db_file", "Database file name must not be empty");
        }

        if self.cache.cache_ttl_minutes == 0 {
            result.add_warning(
                "cache.cache_ttl_minutes",
                "Cache disabled (0 minutes), every read hits the network",
            );
        } else if self.cache.cache_ttl_minutes > 1440 {
            result.add_warning(
                "cache.cache_ttl_minutes",
                "Cache TTL is more than 24 hours",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Full path of the cache database
    pub fn db_path(&self) -> PathBuf {
        let file = Path::new(&self.cache.db_file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.config_dir.join(file)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Io(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)
            .map_err(|e| ConfigError::Io(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Io("Failed to get config directory".to_string()))?
            .join("tenki");

        Ok(config_dir.join("config.toml"))
    }
}
