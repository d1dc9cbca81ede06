mod render;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tenki_core::{AppError, Config};
use tenki_forecast::ForecastService;

/// Regional weather forecasts from the Japan Meteorological Agency.
#[derive(Debug, Parser)]
#[command(name = "tenki", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Refresh the region catalog and list region codes
    Regions,
    /// Show the forecast for a region code, e.g. 130000 for Tokyo
    Forecast {
        code: String,
        /// Ignore a fresh cached forecast and fetch again
        #[arg(long)]
        refresh: bool,
        /// Show every forecast day (fetched live, not cached)
        #[arg(long, conflicts_with = "refresh")]
        days: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tenki_core::init()?;

    let service = match open_service() {
        Ok(service) => service,
        Err(err) => {
            report_startup_error(&err, &mut std::io::stderr().lock())?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut out = std::io::stdout().lock();
    match cli.command {
        None | Some(Command::Regions) => {
            let regions = service.regions().await;
            render::regions(&mut out, &regions)?;
        }
        Some(Command::Forecast { code, refresh, days }) => {
            let name = service.region_name(&code);
            let records = if days {
                service.daily(&code).await
            } else if refresh {
                service.refresh(&code).await.into_iter().collect()
            } else {
                service.forecast(&code).await.into_iter().collect()
            };
            render::forecasts(&mut out, &code, name.as_deref(), &records, |r| {
                service.icon_url(r)
            })?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load and validate the config, then open the cache it points at.
fn open_service() -> Result<ForecastService, AppError> {
    let (config, _) = Config::load_validated()?;
    tracing::debug!("Using cache at {}", config.db_path().display());
    Ok(ForecastService::new(&config)?)
}

fn report_startup_error(err: &AppError, out: &mut impl Write) -> std::io::Result<()> {
    tracing::error!("Startup failed: {}", err);
    writeln!(out, "{}", err.user_message())
}
