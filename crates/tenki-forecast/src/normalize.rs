//! Flattening of JMA forecast documents.
//!
//! A forecast document is an array of reports. Only the first report is
//! read. Its `timeSeries[0].areas[0]` carries weather, wind and icon codes;
//! the first time series whose leading area has a `temps` key carries the
//! min/max temperature pair.
//!
//! Missing arrays degrade to placeholders. Missing structure (no report,
//! no time series, no areas, no report time) is a parse error.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::error::{ForecastError, ForecastResult};
use crate::types::{ForecastRecord, PLACEHOLDER, TEMP_PLACEHOLDER};

/// Normalize a forecast document into the record for the report day.
pub fn normalize(region_code: &str, doc: &Value) -> ForecastResult<ForecastRecord> {
    let report = first_report(doc)?;
    let date = iso_date(report_datetime(report)?)?;
    let area = primary_area(report)?;
    let (min_temp, max_temp) = temperatures(report)?;

    Ok(ForecastRecord {
        region_code: region_code.to_string(),
        date,
        weather: nth_text(area, "weathers", 0),
        weather_code: nth_text(area, "weatherCodes", 0),
        wind: nth_text(area, "winds", 0),
        max_temp,
        min_temp,
    })
}

/// Normalize a forecast document into one record per forecast day.
///
/// Days come from `timeSeries[0].timeDefines`. Temperatures are only
/// published for the first day; later days carry the placeholder.
/// Falls back to the single report-day record when no time defines exist.
pub fn normalize_daily(region_code: &str, doc: &Value) -> ForecastResult<Vec<ForecastRecord>> {
    let report = first_report(doc)?;
    let area = primary_area(report)?;

    let defines = time_series(report)?
        .first()
        .and_then(|ts| ts.get("timeDefines"))
        .and_then(Value::as_array)
        .filter(|d| !d.is_empty());

    let Some(defines) = defines else {
        return Ok(vec![normalize(region_code, doc)?]);
    };

    let (min_temp, max_temp) = temperatures(report)?;

    defines
        .iter()
        .enumerate()
        .map(|(i, define)| -> ForecastResult<ForecastRecord> {
            let raw = define
                .as_str()
                .ok_or_else(|| ForecastError::parse(format!("timeDefines[{}] is not a string", i)))?;
            let (min, max) = if i == 0 {
                (min_temp.clone(), max_temp.clone())
            } else {
                (TEMP_PLACEHOLDER.to_string(), TEMP_PLACEHOLDER.to_string())
            };

            Ok(ForecastRecord {
                region_code: region_code.to_string(),
                date: iso_date(raw)?,
                weather: nth_text(area, "weathers", i),
                weather_code: nth_text(area, "weatherCodes", i),
                wind: nth_text(area, "winds", i),
                max_temp: max,
                min_temp: min,
            })
        })
        .collect()
}

fn first_report(doc: &Value) -> ForecastResult<&Value> {
    doc.as_array()
        .and_then(|reports| reports.first())
        .ok_or_else(|| ForecastError::parse("forecast document has no reports"))
}

fn report_datetime(report: &Value) -> ForecastResult<&str> {
    report
        .get("reportDatetime")
        .and_then(Value::as_str)
        .ok_or_else(|| ForecastError::parse("report is missing reportDatetime"))
}

fn time_series(report: &Value) -> ForecastResult<&Vec<Value>> {
    report
        .get("timeSeries")
        .and_then(Value::as_array)
        .filter(|ts| !ts.is_empty())
        .ok_or_else(|| ForecastError::parse("report has no timeSeries"))
}

fn primary_area(report: &Value) -> ForecastResult<&Value> {
    time_series(report)?
        .first()
        .and_then(leading_area)
        .ok_or_else(|| ForecastError::parse("timeSeries[0] has no areas"))
}

fn leading_area(series: &Value) -> Option<&Value> {
    series.get("areas")?.as_array()?.first()
}

/// Returns `(min, max)` from the first series with temperatures.
fn temperatures(report: &Value) -> ForecastResult<(String, String)> {
    let temps = time_series(report)?
        .iter()
        .filter_map(leading_area)
        .find_map(|area| area.get("temps"))
        .and_then(Value::as_array);

    let pick = |idx: usize| {
        temps
            .and_then(|t| t.get(idx))
            .and_then(text)
            .unwrap_or_else(|| TEMP_PLACEHOLDER.to_string())
    };

    Ok((pick(0), pick(1)))
}

fn nth_text(area: &Value, key: &str, idx: usize) -> String {
    area.get(key)
        .and_then(Value::as_array)
        .and_then(|values| values.get(idx))
        .and_then(text)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `2024-05-01T11:00:00+09:00` -> `2024-05-01`. The date is taken in the
/// timestamp's own offset, matching what JMA publishes.
fn iso_date(raw: &str) -> ForecastResult<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.format("%Y-%m-%d").to_string());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .map_err(|e| ForecastError::parse(format!("invalid timestamp {:?}: {}", raw, e)))
}
