//! Terminal rendering of the region list and forecast cards.

use std::io::{self, Write};

use tenki_forecast::{ForecastRecord, Region, TEMP_PLACEHOLDER};

const NO_REGIONS: &str = "地域情報が取得できませんでした。";
const NO_FORECAST: &str = "天気情報が取得できませんでした。";

pub fn regions<W: Write>(out: &mut W, regions: &[Region]) -> io::Result<()> {
    if regions.is_empty() {
        return writeln!(out, "{}", NO_REGIONS);
    }
    for region in regions {
        writeln!(out, "{}  {}", region.code, region.name)?;
    }
    Ok(())
}

pub fn forecasts<W, F>(
    out: &mut W,
    code: &str,
    name: Option<&str>,
    records: &[ForecastRecord],
    icon_url: F,
) -> io::Result<()>
where
    W: Write,
    F: Fn(&ForecastRecord) -> Option<String>,
{
    match name {
        Some(name) if !name.is_empty() => writeln!(out, "{} ({})", name, code)?,
        _ => writeln!(out, "{}", code)?,
    }

    if records.is_empty() {
        return writeln!(out, "{}", NO_FORECAST);
    }

    for record in records {
        card(out, record, icon_url(record).as_deref())?;
    }
    Ok(())
}

fn card<W: Write>(out: &mut W, record: &ForecastRecord, icon_url: Option<&str>) -> io::Result<()> {
    let condition = record.condition();
    writeln!(out, "┌ {}  {} {}", record.date, condition.symbol(), condition.icon_name())?;
    writeln!(out, "│ {}", record.weather)?;
    writeln!(out, "│ 風: {}", record.wind)?;
    writeln!(
        out,
        "│ 最低 {} / 最高 {}",
        temperature(&record.min_temp),
        temperature(&record.max_temp)
    )?;
    if let Some(url) = icon_url {
        writeln!(out, "│ {}", url)?;
    }
    writeln!(out, "└")
}

fn temperature(value: &str) -> String {
    if value == TEMP_PLACEHOLDER {
        value.to_string()
    } else {
        format!("{}°C", value)
    }
}
