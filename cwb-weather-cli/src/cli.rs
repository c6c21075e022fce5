use anyhow::Context;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use cwb_weather_core::{Config, WeatherCard, WeatherError, card_from_config};
use inquire::{Password, Text};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cwb-weather", version, about = "Weather card backed by CWB open data")]
pub struct Cli {
    /// Observation station name, overriding the configured one.
    #[arg(long, global = true)]
    pub station: Option<String>,

    /// County/city name for the forecast, overriding the configured one.
    #[arg(long, global = true)]
    pub district: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, station and district.
    Configure,

    /// Fetch once and print the card.
    Show,

    /// Print the card; press Enter to refresh, `q` to quit.
    Watch,

    /// Print whether it is day or night at a location.
    Moment {
        /// Location name in the sunrise/sunset table; defaults to the district.
        #[arg(long)]
        location: Option<String>,

        /// Local time as YYYY-MM-DDTHH:MM:SS; if absent, means "now".
        #[arg(long, value_parser = parse_local_time)]
        at: Option<NaiveDateTime>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        if let Some(station) = self.station {
            config.station = station;
        }
        if let Some(district) = self.district {
            config.district = district;
        }

        match self.command {
            Command::Configure => configure(config),
            Command::Show => show(&config).await,
            Command::Watch => watch(&config).await,
            Command::Moment { location, at } => {
                let table = config.sun_table()?;
                let location = location.unwrap_or(config.district);
                let moment = match at {
                    Some(at) => table.moment(&location, at),
                    None => table.moment_now(&location),
                };

                match moment {
                    Some(moment) => println!("{moment}"),
                    None => println!("unknown ({location} is not covered by the sunrise/sunset table)"),
                }
                Ok(())
            }
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("CWB authorization key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    let station = Text::new("Observation station:")
        .with_default(&config.station)
        .prompt()
        .context("Failed to read station name")?;
    config.station = station;

    let district = Text::new("Forecast county/city:")
        .with_default(&config.district)
        .prompt()
        .context("Failed to read district name")?;
    config.district = district;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(config: &Config) -> anyhow::Result<()> {
    let card = card_from_config(config)?;
    card.refresh().await.context("Failed to fetch weather")?;
    println!("{}", card.view_now());
    Ok(())
}

async fn watch(config: &Config) -> anyhow::Result<()> {
    let card = Arc::new(card_from_config(config)?);

    let mut rx = card.subscribe();
    let printer = tokio::spawn({
        let card = card.clone();
        async move {
            while rx.changed().await.is_ok() {
                println!("{}\n", card.view_now());
            }
        }
    });

    spawn_refresh(&card);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "q" | "quit" => break,
            _ => spawn_refresh(&card),
        }
    }

    printer.abort();
    Ok(())
}

/// Refresh in the background so a second request can observe the one in flight.
fn spawn_refresh(card: &Arc<WeatherCard>) {
    let card = card.clone();
    tokio::spawn(async move {
        if let Err(WeatherError::RefreshInFlight) = card.refresh().await {
            eprintln!("Refresh already in progress");
        }
    });
}

fn parse_local_time(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM:SS: {e}"))
}
