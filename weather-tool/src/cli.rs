use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_core::{Config, WeatherTool, service_from_config};

use crate::{logging, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-tool", version, about = "Weather tools for agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct Location {
    /// City name, e.g. "London".
    pub city: String,

    /// Optional country code, e.g. "UK" or "US".
    #[arg(long, short)]
    pub country: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key.
    Configure,

    /// Show current weather for a city.
    Current(Location),

    /// Show the 5-day forecast for a city.
    Forecast(Location),

    /// Show active weather alerts for a city.
    Alerts(Location),

    /// Run an MCP server over stdin/stdout.
    Serve,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        logging::init(config.log_level());

        match self.command {
            Command::Configure => configure(config),
            Command::Current(loc) => {
                let tool = build_tool(config)?;
                print_output(&tool.get_current_weather(&loc.city, loc.country.as_deref()).await);
                Ok(())
            }
            Command::Forecast(loc) => {
                let tool = build_tool(config)?;
                print_output(&tool.get_weather_forecast(&loc.city, loc.country.as_deref()).await);
                Ok(())
            }
            Command::Alerts(loc) => {
                let tool = build_tool(config)?;
                print_output(&tool.get_weather_alerts(&loc.city, loc.country.as_deref()).await);
                Ok(())
            }
            Command::Serve => server::run(build_tool(config)?).await,
        }
    }
}

fn print_output(output: &str) {
    println!("{}", output.trim_end());
}

fn build_tool(config: Config) -> anyhow::Result<WeatherTool> {
    let config = config.with_env_overrides();
    let service = service_from_config(&config)?;
    Ok(WeatherTool::new(service))
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    let path = Config::config_file_path()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}
