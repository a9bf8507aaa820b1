use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, error::Category};

use crate::{
    config::{ApiKey, Endpoints},
    error::{FailurePhase, Malformation, WeatherError},
    model::{AlertEntry, Coordinate, CurrentWeather, ForecastEntry, format_alerts, format_forecast},
};

use super::WeatherService;

const GEOCODING_LIMIT: &str = "5";
const CURRENT_EXCLUDE: &str = "minutely,hourly,alerts";
const ALERTS_EXCLUDE: &str = "minutely,hourly,current,daily";
const NO_ALERTS: &str = "No weather alerts for this location.";
const FORECAST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// OpenWeatherMap-backed resolver: geocoding, one-call and 5-day forecast.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections and is
/// shared between clones.
#[derive(Debug, Clone)]
pub struct OpenWeatherResolver {
    api_key: ApiKey,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherResolver {
    pub fn new(api_key: ApiKey, endpoints: Endpoints) -> Self {
        Self::with_client(Client::new(), api_key, endpoints)
    }

    pub fn with_client(http: Client, api_key: ApiKey, endpoints: Endpoints) -> Self {
        Self { api_key, endpoints, http }
    }

    /// Geocode a city, keeping the reason for a miss.
    pub async fn geocode(
        &self,
        city: &str,
        country_code: Option<&str>,
    ) -> Result<Coordinate, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::InvalidInput("city name is empty".to_string()));
        }

        let query = match country_code.map(str::trim).filter(|cc| !cc.is_empty()) {
            Some(cc) => format!("{city},{cc}"),
            None => city.to_string(),
        };

        let url = format!("{}/direct", self.endpoints.geocoding.trim_end_matches('/'));
        let locations: Vec<Value> = self
            .fetch_json(&url, &[("q", query.clone()), ("limit", GEOCODING_LIMIT.to_string())])
            .await?;

        let Some(first) = locations.into_iter().next() else {
            return Err(WeatherError::NotFound(format!("no geocoding results for '{query}'")));
        };

        let first: OwGeoLocation = decode(first)?;
        match (first.lat, first.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon).map_err(|_| {
                WeatherError::shape(format!("geocoder returned out-of-range coordinates {lat}, {lon}"))
            }),
            _ => Err(WeatherError::NotFound(format!("lat or lon missing for '{query}'"))),
        }
    }

    pub async fn fetch_current(&self, at: Coordinate) -> Result<CurrentWeather, WeatherError> {
        let parsed: OwOneCall = self
            .fetch_json(&self.endpoints.onecall, &onecall_query(at, CURRENT_EXCLUDE))
            .await?;

        let current = parsed.current.ok_or(WeatherError::missing("current"))?;
        Ok(CurrentWeather {
            temperature_c: current.temp.ok_or(WeatherError::missing("temp"))?,
            description: first_description(current.weather)?,
        })
    }

    pub async fn fetch_forecast(&self, at: Coordinate) -> Result<Vec<ForecastEntry>, WeatherError> {
        let query = [
            ("lat", at.lat.to_string()),
            ("lon", at.lon.to_string()),
            ("units", "metric".to_string()),
        ];
        let parsed: OwForecast = self.fetch_json(&self.endpoints.forecast, &query).await?;

        parsed
            .list
            .ok_or(WeatherError::missing("list"))?
            .into_iter()
            .map(forecast_entry)
            .collect()
    }

    /// Active alerts; an absent `alerts` key means there are none.
    pub async fn fetch_alerts(&self, at: Coordinate) -> Result<Vec<AlertEntry>, WeatherError> {
        let parsed: OwOneCall = self
            .fetch_json(&self.endpoints.onecall, &onecall_query(at, ALERTS_EXCLUDE))
            .await?;

        parsed
            .alerts
            .unwrap_or_default()
            .into_iter()
            .map(|alert| {
                Ok(AlertEntry {
                    event: alert.event.ok_or(WeatherError::missing("event"))?,
                    description: alert.description.ok_or(WeatherError::missing("description"))?,
                })
            })
            .collect()
    }

    /// One GET with the credential appended, decoded into `T`.
    ///
    /// Request errors are stripped of their URL so the `appid` parameter never
    /// reaches logs or error strings.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        tracing::debug!(endpoint = %url, "sending OpenWeatherMap request");

        let res = self
            .http
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.expose())])
            .send()
            .await
            .map_err(|e| WeatherError::UpstreamUnavailable(e.without_url().to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::UpstreamUnavailable(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(WeatherError::UpstreamUnavailable(format!(
                "status {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|e| match e.classify() {
            Category::Data => WeatherError::shape(e.to_string()),
            Category::Io | Category::Syntax | Category::Eof => {
                Malformation::InvalidJson(e.to_string()).into()
            }
        })
    }
}

#[async_trait]
impl WeatherService for OpenWeatherResolver {
    async fn resolve_coordinates(
        &self,
        city: &str,
        country_code: Option<&str>,
    ) -> Option<Coordinate> {
        match self.geocode(city, country_code).await {
            Ok(coordinate) => Some(coordinate),
            Err(err @ WeatherError::NotFound(_)) => {
                tracing::info!(city, country_code = ?country_code, "No coordinates found: {}", err);
                None
            }
            Err(err @ WeatherError::InvalidInput(_)) => {
                tracing::warn!(city, country_code = ?country_code, "Rejected geocoding request: {}", err);
                None
            }
            Err(err) => {
                tracing::error!(
                    endpoint = %self.endpoints.geocoding,
                    city,
                    country_code = ?country_code,
                    "Geocoding failed: {}",
                    err
                );
                None
            }
        }
    }

    async fn current_weather(&self, lat: f64, lon: f64) -> Option<String> {
        let at = match Coordinate::new(lat, lon) {
            Ok(at) => at,
            Err(err) => {
                tracing::error!(lat, lon, "Invalid latitude or longitude: {}", err);
                return None;
            }
        };

        match self.fetch_current(at).await {
            Ok(weather) => Some(weather.to_string()),
            Err(err) => {
                tracing::error!(
                    endpoint = %self.endpoints.onecall,
                    lat,
                    lon,
                    "Could not get current weather: {}",
                    err
                );
                None
            }
        }
    }

    async fn forecast(&self, lat: f64, lon: f64) -> String {
        let result = match Coordinate::new(lat, lon) {
            Ok(at) => self.fetch_forecast(at).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(entries) => format_forecast(&entries),
            Err(err) => {
                tracing::error!(
                    endpoint = %self.endpoints.forecast,
                    lat,
                    lon,
                    "Could not get weather forecast: {}",
                    err
                );
                fallback(FailurePhase::from(&err), "weather forecast")
            }
        }
    }

    async fn alerts(&self, lat: f64, lon: f64) -> String {
        let result = match Coordinate::new(lat, lon) {
            Ok(at) => self.fetch_alerts(at).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(alerts) if alerts.is_empty() => NO_ALERTS.to_string(),
            Ok(alerts) => format_alerts(&alerts),
            Err(err) => {
                tracing::error!(
                    endpoint = %self.endpoints.onecall,
                    lat,
                    lon,
                    "Could not get weather alerts: {}",
                    err
                );
                fallback(FailurePhase::from(&err), "weather alerts")
            }
        }
    }
}

fn onecall_query(at: Coordinate, exclude: &str) -> [(&'static str, String); 4] {
    [
        ("lat", at.lat.to_string()),
        ("lon", at.lon.to_string()),
        ("exclude", exclude.to_string()),
        ("units", "metric".to_string()),
    ]
}

fn fallback(phase: FailurePhase, subject: &str) -> String {
    match phase {
        FailurePhase::Fetch => format!("Could not fetch {subject}."),
        FailurePhase::Parse => format!("Could not parse {subject}."),
        FailurePhase::Process => format!("Could not process {subject}."),
    }
}

/// Decode one element of a loosely-typed array.
fn decode<T: DeserializeOwned>(item: Value) -> Result<T, WeatherError> {
    serde_json::from_value(item).map_err(|e| WeatherError::shape(e.to_string()))
}

/// Only `weather[0]` is read; later conditions are not inspected.
fn first_description(weather: Option<Vec<Value>>) -> Result<String, WeatherError> {
    let first = weather
        .ok_or(WeatherError::missing("weather"))?
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::shape("`weather` array is empty"))?;

    let first: OwCondition = decode(first)?;
    first.description.ok_or(WeatherError::missing("description"))
}

fn forecast_entry(item: OwForecastItem) -> Result<ForecastEntry, WeatherError> {
    let timestamp = item.dt_txt.ok_or(WeatherError::missing("dt_txt"))?;
    if let Err(e) = NaiveDateTime::parse_from_str(&timestamp, FORECAST_TIME_FORMAT) {
        tracing::warn!(dt_txt = %timestamp, "Unexpected forecast timestamp layout: {}", e);
    }
    let main = item.main.ok_or(WeatherError::missing("main"))?;

    Ok(ForecastEntry {
        timestamp,
        temperature_c: main.temp.ok_or(WeatherError::missing("temp"))?,
        description: first_description(item.weather)?,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

// Every field is optional so a missing key can be told apart from a key with
// the wrong type. Arrays read by index stay as raw values so a bad trailing
// element cannot sink the one we use.

#[derive(Debug, Deserialize)]
struct OwGeoLocation {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    temp: Option<f64>,
    weather: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct OwAlert {
    event: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwOneCall {
    current: Option<OwCurrent>,
    alerts: Option<Vec<OwAlert>>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastItem {
    dt_txt: Option<String>,
    main: Option<OwMain>,
    weather: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct OwForecast {
    list: Option<Vec<OwForecastItem>>,
}
