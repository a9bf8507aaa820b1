//! `weather-tool`: current weather, forecasts and alerts for agents.
//!
//! `weather-tool serve` runs an MCP server on stdin/stdout exposing
//! `get_current_weather`, `get_weather_forecast` and `get_weather_alerts`.
//! `current`, `forecast` and `alerts` run a single tool call and print its
//! text; `configure` stores the OpenWeatherMap API key. Logs go to stderr.

use clap::Parser;

mod cli;
mod logging;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
