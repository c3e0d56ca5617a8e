use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use climatrack_core::{Config, Coordinate, RetrievalParams, Retriever};
use inquire::{Confirm, CustomType, Text};
use tracing::info;

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "climatrack",
    version,
    about = "Daily NASA POWER observations with backward-day fallback"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Either a single day or an inclusive range, all `YYYYMMDD`.
#[derive(Debug, Args)]
pub struct DateArgs {
    /// Single day; falls back to earlier days when it has no data.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub date: Option<String>,

    /// Range start (requires --end). Ranges are fetched without fallback.
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Range end (requires --start).
    #[arg(long, requires = "start")]
    pub end: Option<String>,
}

impl DateArgs {
    fn into_params(self, coordinate: Coordinate) -> RetrievalParams {
        RetrievalParams {
            latitude: Some(coordinate.latitude),
            longitude: Some(coordinate.longitude),
            date: self.date,
            start_date: self.start,
            end_date: self.end,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch observations for a coordinate.
    Fetch {
        #[arg(long, allow_hyphen_values = true)]
        lat: String,

        #[arg(long, allow_hyphen_values = true)]
        lon: String,

        #[command(flatten)]
        dates: DateArgs,

        /// Print single-line JSON.
        #[arg(long)]
        compact: bool,
    },

    /// Geocode a location name, then fetch observations for it.
    Show {
        /// City or address, matched against the city table.
        location: String,

        #[command(flatten)]
        dates: DateArgs,

        #[arg(long)]
        compact: bool,
    },

    /// Print the coordinate a location name resolves to.
    Geocode { location: String },

    /// Interactively edit the configuration file.
    Configure,

    /// Serve the retrieval and geocoding endpoints over HTTP.
    Serve {
        /// Listen address; defaults to the configured one.
        #[arg(long)]
        bind: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Fetch {
                lat,
                lon,
                dates,
                compact,
            } => {
                let config = Config::load()?;
                let params = dates.into_params(Coordinate::new(lat, lon));
                fetch_and_print(&config, &params, compact).await
            }
            Command::Show {
                location,
                dates,
                compact,
            } => {
                let config = Config::load()?;
                let coordinate = config.city_table().resolve(&location);
                let params = dates.into_params(coordinate);
                fetch_and_print(&config, &params, compact).await
            }
            Command::Geocode { location } => {
                let coordinate = Config::load()?.city_table().resolve(&location);
                println!("{}", serde_json::to_string_pretty(&coordinate)?);
                Ok(())
            }
            Command::Configure => configure(),
            Command::Serve { bind } => {
                let config = Config::load()?;
                let bind = bind.unwrap_or_else(|| config.bind.clone());
                let state = server::AppState::new(
                    Retriever::from_config(&config)?,
                    config.city_table(),
                );
                server::serve(&bind, state).await
            }
        }
    }
}

async fn fetch_and_print(
    config: &Config,
    params: &RetrievalParams,
    compact: bool,
) -> anyhow::Result<()> {
    let retriever = Retriever::from_config(config)?;

    match retriever.retrieve(params).await {
        Ok(response) => {
            println!("{}", render(&response, compact)?);
            if !response.has_data() {
                info!(message = %response.message, "No usable data");
            }
            Ok(())
        }
        Err(err) => {
            println!("{}", render(&err.to_body(), compact)?);
            Err(err).context("Retrieval failed")
        }
    }
}

fn render<T: serde::Serialize>(value: &T, compact: bool) -> anyhow::Result<String> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(out)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let path = Config::config_file_path()?;
    println!("Editing {}", path.display());

    config.base_url = Text::new("NASA POWER endpoint:")
        .with_default(&config.base_url)
        .prompt()?;
    config.community = Text::new("POWER community:")
        .with_default(&config.community)
        .prompt()?;
    config.timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.timeout_secs)
        .prompt()?;
    config.max_fallback_steps = CustomType::<u32>::new("Days to try for a single-day query:")
        .with_default(config.max_fallback_steps)
        .prompt()?;
    config.bind = Text::new("Server listen address:")
        .with_default(&config.bind)
        .prompt()?;

    while Confirm::new("Add a city to the lookup table?")
        .with_default(false)
        .prompt()?
    {
        let name = Text::new("City name:").prompt()?;
        let latitude = Text::new("Latitude:").prompt()?;
        let longitude = Text::new("Longitude:").prompt()?;
        config.upsert_city(&name, Coordinate::new(latitude, longitude));
    }

    config.save()?;
    println!("Saved {}", path.display());
    Ok(())
}
