use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside [-90, 90] / [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Result<Self, WeatherError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(WeatherError::InvalidInput(format!(
                "coordinates out of range: lat={lat}, lon={lon}"
            )));
        }

        Ok(Self { lat, lon })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Temperatures here and in [`ForecastEntry`] render through `f64`'s `Display`,
/// which drops trailing zeros: `20.50` from the provider prints as `20.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub temperature_c: f64,
    pub description: String,
}

impl fmt::Display for CurrentWeather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Current weather: {}°C, {}", self.temperature_c, self.description)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    /// `dt_txt` exactly as the provider sent it.
    pub timestamp: String,
    pub temperature_c: f64,
    pub description: String,
}

impl fmt::Display for ForecastEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Date: {}, Temp: {}°C, Description: {}",
            self.timestamp,
            self.temperature_c,
            self.description
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertEntry {
    pub event: String,
    pub description: String,
}

impl fmt::Display for AlertEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event: {}, Description: {}", self.event, self.description)
    }
}

/// Render a forecast as a header line followed by one line per entry.
pub fn format_forecast(entries: &[ForecastEntry]) -> String {
    let mut out = String::from("Weather forecast:\n");
    for entry in entries {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out
}

/// Render alerts; callers handle the empty case separately.
pub fn format_alerts(alerts: &[AlertEntry]) -> String {
    let mut out = String::from("Weather Alerts:\n");
    for alert in alerts {
        out.push_str(&alert.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn coordinate_rejects_out_of_range_and_nan() {
        assert!(Coordinate::new(-100.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());

        let err = Coordinate::new(-100.0, -200.0).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidInput(_)));
    }

    #[test]
    fn current_weather_drops_trailing_zero() {
        let w = CurrentWeather { temperature_c: 20.0, description: "Sunny".into() };
        assert_eq!(w.to_string(), "Current weather: 20°C, Sunny");

        let w = CurrentWeather { temperature_c: 20.50, description: "Cloudy".into() };
        assert_eq!(w.to_string(), "Current weather: 20.5°C, Cloudy");

        let w = CurrentWeather { temperature_c: -3.5, description: "Snow".into() };
        assert_eq!(w.to_string(), "Current weather: -3.5°C, Snow");
    }

    #[test]
    fn forecast_keeps_entry_order() {
        let entries = vec![
            ForecastEntry {
                timestamp: "2024-01-01 00:00:00".to_string(),
                temperature_c: 15.0,
                description: "Clear sky".into(),
            },
            ForecastEntry {
                timestamp: "2024-01-01 03:00:00".to_string(),
                temperature_c: 12.25,
                description: "Few clouds".into(),
            },
        ];

        assert_eq!(
            format_forecast(&entries),
            "Weather forecast:\n\
             Date: 2024-01-01 00:00:00, Temp: 15°C, Description: Clear sky\n\
             Date: 2024-01-01 03:00:00, Temp: 12.25°C, Description: Few clouds\n"
        );
    }

    #[test]
    fn empty_forecast_is_just_the_header() {
        assert_eq!(format_forecast(&[]), "Weather forecast:\n");
    }
}
