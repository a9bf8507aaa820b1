use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{Config, model::Coordinate};

pub mod openweather;

pub use openweather::OpenWeatherResolver;

/// The weather-resolution surface the tools are built on.
///
/// Every method absorbs upstream failures: geocoding and current conditions
/// signal them as `None`, forecast and alerts as a fixed fallback string.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    /// Turn a city (and optional country code) into coordinates.
    async fn resolve_coordinates(&self, city: &str, country_code: Option<&str>)
    -> Option<Coordinate>;

    async fn current_weather(&self, lat: f64, lon: f64) -> Option<String>;

    async fn forecast(&self, lat: f64, lon: f64) -> String;

    async fn alerts(&self, lat: f64, lon: f64) -> String;
}

/// Construct the OpenWeatherMap resolver from config.
pub fn service_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherService>> {
    let api_key = config.api_key()?;
    let resolver = OpenWeatherResolver::new(api_key.clone(), config.endpoints.clone());
    Ok(Arc::new(resolver))
}
