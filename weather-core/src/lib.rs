//! Core library for the `weather-tool` binary.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeatherMap resolver (geocoding, current conditions, forecast, alerts)
//! - Agent-facing tools that wrap the resolver and never fail outward
//!
//! It is used by `weather-tool`, but can also be embedded in other tool hosts.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod tool;

pub use config::{ApiKey, Config, Endpoints};
pub use error::{Malformation, WeatherError};
pub use model::{AlertEntry, Coordinate, CurrentWeather, ForecastEntry};
pub use provider::{OpenWeatherResolver, WeatherService, service_from_config};
pub use tool::{ToolName, WeatherTool};
