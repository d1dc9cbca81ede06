//! SQLite-backed forecast cache.
//!
//! Two tables: `Areas` holds the region catalog (unique by code) and
//! `Forecasts` is an append-only log of normalized forecasts. The row with
//! the highest id for a code is that code's current forecast.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::ForecastResult;
use crate::types::{CachedForecast, ForecastRecord, Region, PLACEHOLDER};

pub struct ForecastCache {
    conn: Connection,
}

impl ForecastCache {
    /// Open (or create) the cache at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> ForecastResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache.
    pub fn in_memory() -> ForecastResult<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> ForecastResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS Areas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                area_code TEXT UNIQUE,
                area_name TEXT
            );

            CREATE TABLE IF NOT EXISTS Forecasts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                area_code TEXT,
                date TEXT,
                weather TEXT,
                wind TEXT,
                max_temp TEXT,
                min_temp TEXT,
                weather_code TEXT NOT NULL DEFAULT '-',
                fetched_at INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )?;
        self.upgrade_forecasts_table()
    }

    /// Databases written before icon codes and fetch times were tracked
    /// lack the two trailing columns. Their rows read as stale.
    fn upgrade_forecasts_table(&self) -> ForecastResult<()> {
        let columns: Vec<String> = self
            .conn
            .prepare("PRAGMA table_info(Forecasts)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;

        if !columns.iter().any(|c| c == "weather_code") {
            tracing::info!("Adding weather_code column to Forecasts");
            self.conn.execute_batch(
                "ALTER TABLE Forecasts ADD COLUMN weather_code TEXT NOT NULL DEFAULT '-';",
            )?;
        }
        if !columns.iter().any(|c| c == "fetched_at") {
            tracing::info!("Adding fetched_at column to Forecasts");
            self.conn.execute_batch(
                "ALTER TABLE Forecasts ADD COLUMN fetched_at INTEGER NOT NULL DEFAULT 0;",
            )?;
        }
        Ok(())
    }

    /// Insert regions, ignoring codes already present.
    ///
    /// Returns how many rows were newly inserted.
    pub fn store_regions(&self, regions: &[Region]) -> ForecastResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO Areas (area_code, area_name) VALUES (?1, ?2)",
            )?;
            for region in regions {
                inserted += stmt.execute(params![region.code, region.name])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// All cached regions, ordered by code.
    pub fn list_regions(&self) -> ForecastResult<Vec<Region>> {
        let mut stmt = self
            .conn
            .prepare("SELECT area_code, area_name FROM Areas ORDER BY area_code")?;

        let rows = stmt.query_map([], |row| {
            Ok(Region {
                code: row.get(0)?,
                name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn region_name(&self, code: &str) -> ForecastResult<Option<String>> {
        let name = self
            .conn
            .query_row(
                "SELECT area_name FROM Areas WHERE area_code = ?1",
                params![code],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(name.flatten())
    }

    pub fn region_count(&self) -> ForecastResult<u32> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM Areas", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Append a forecast stamped with the current time.
    pub fn store_forecast(&self, record: &ForecastRecord) -> ForecastResult<i64> {
        self.store_forecast_at(record, Utc::now())
    }

    /// Append a forecast with an explicit fetch time. Returns the row id.
    pub fn store_forecast_at(
        &self,
        record: &ForecastRecord,
        fetched_at: DateTime<Utc>,
    ) -> ForecastResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO Forecasts
            (area_code, date, weather, wind, max_temp, min_temp, weather_code, fetched_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.region_code,
                record.date,
                record.weather,
                record.wind,
                record.max_temp,
                record.min_temp,
                record.weather_code,
                fetched_at.timestamp_millis(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recently inserted forecast for a region code.
    pub fn latest_forecast(&self, code: &str) -> ForecastResult<Option<CachedForecast>> {
        let cached = self
            .conn
            .query_row(
                r#"
                SELECT date, weather, wind, max_temp, min_temp, weather_code, fetched_at
                FROM Forecasts
                WHERE area_code = ?1
                ORDER BY id DESC LIMIT 1
                "#,
                params![code],
                |row| {
                    let fetched_ms: i64 = row.get(6)?;
                    Ok(CachedForecast {
                        record: ForecastRecord {
                            region_code: code.to_string(),
                            date: text_or_placeholder(row.get(0)?),
                            weather: text_or_placeholder(row.get(1)?),
                            wind: text_or_placeholder(row.get(2)?),
                            max_temp: text_or_placeholder(row.get(3)?),
                            min_temp: text_or_placeholder(row.get(4)?),
                            weather_code: row.get(5)?,
                        },
                        fetched_at: DateTime::from_timestamp_millis(fetched_ms)
                            .unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        Ok(cached)
    }

    /// Number of forecast rows stored for a region code.
    pub fn forecast_count(&self, code: &str) -> ForecastResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM Forecasts WHERE area_code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Clear all cached data.
    pub fn clear(&self) -> ForecastResult<()> {
        self.conn
            .execute_batch("DELETE FROM Forecasts; DELETE FROM Areas;")?;
        Ok(())
    }
}

fn text_or_placeholder(value: Option<String>) -> String {
    value.unwrap_or_else(|| PLACEHOLDER.to_string())
}
