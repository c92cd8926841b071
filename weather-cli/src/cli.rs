use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use cityweather_core::{
    CacheStore, Config, Coordinator, FileStore, KeyValueStore, ThemePreference, ThemeSettings,
    WeatherState, provider_from_config,
};
use tracing::info;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather by city, with offline cache")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the VisualCrossing API key.
    Configure,

    /// Look up current weather for a city.
    Search {
        /// City name, e.g. "Paris" or "New York, NY".
        city: String,
    },

    /// Re-fetch the last searched city.
    Refresh,

    /// Show the cached weather without touching the network.
    Show,

    /// Remove cached weather and preferences.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Show or toggle the light/dark preference.
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { city } => {
                let coordinator = coordinator(&Config::load()?)?;
                coordinator
                    .search_city(city)
                    .await
                    .context("search task failed")?;
                finish(coordinator.state())
            }
            Command::Refresh => {
                let coordinator = coordinator(&Config::load()?)?;
                coordinator.restore_cached().await;
                coordinator.refresh_weather().await;
                finish(coordinator.state())
            }
            Command::Show => {
                let cache = CacheStore::new(store(&Config::load()?)?);
                match cache.load().await? {
                    Some(entry) => render::print_record(&entry.record),
                    None => println!("No cached weather (never searched, or older than one hour)."),
                }
                Ok(())
            }
            Command::Clear { yes } => {
                let confirmed = yes
                    || inquire::Confirm::new("Remove cached weather and theme preference?")
                        .with_default(false)
                        .prompt()?;
                if confirmed {
                    CacheStore::new(store(&Config::load()?)?).clear_all().await?;
                    println!("Cleared.");
                }
                Ok(())
            }
            Command::Theme { toggle } => {
                let settings = ThemeSettings::load(store(&Config::load()?)?, ThemePreference::Light).await;
                let theme = if toggle { settings.toggle().await } else { settings.current().await };
                println!("Theme: {theme}");
                Ok(())
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    let api_key = inquire::Password::new("VisualCrossing API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    cfg.set_api_key(api_key.trim().to_string());
    cfg.save()?;

    info!(path = %Config::config_file_path()?.display(), "saved configuration");
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn store(cfg: &Config) -> Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(FileStore::new(cfg.data_dir()?)))
}

/// A coordinator without debounce: each CLI invocation issues exactly one search.
fn coordinator(cfg: &Config) -> Result<Arc<Coordinator>> {
    let provider = Arc::from(provider_from_config(cfg)?);
    let cache = CacheStore::new(store(cfg)?);
    Ok(Arc::new(Coordinator::with_debounce(provider, cache, Duration::ZERO)))
}

fn finish(state: WeatherState) -> Result<()> {
    match (&state.current, &state.error) {
        (Some(record), error) => {
            render::print_record(record);
            if let Some(error) = error {
                eprintln!("note: {error}");
            }
            Ok(())
        }
        (None, Some(error)) => Err(anyhow!("{error}")),
        (None, None) => {
            println!("Nothing to show yet. Try `cityweather search <city>`.");
            Ok(())
        }
    }
}
