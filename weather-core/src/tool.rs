//! Agent-facing weather tools.
//!
//! Each tool takes a city and an optional country code and always produces a
//! string. Failures inside the resolver, panics included, are logged and
//! turned into a fixed message; nothing escapes to the transport.

use std::{any::Any, fmt, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;

use crate::{model::Coordinate, provider::WeatherService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CurrentWeather,
    Forecast,
    Alerts,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CurrentWeather => "get_current_weather",
            ToolName::Forecast => "get_weather_forecast",
            ToolName::Alerts => "get_weather_alerts",
        }
    }

    pub const fn all() -> &'static [ToolName] {
        &[ToolName::CurrentWeather, ToolName::Forecast, ToolName::Alerts]
    }

    fn apology(&self) -> &'static str {
        match self {
            ToolName::CurrentWeather => "An error occurred while fetching weather.",
            ToolName::Forecast => "An error occurred while fetching weather forecast.",
            ToolName::Alerts => "An error occurred while fetching weather alerts.",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three weather tools, backed by any [`WeatherService`].
#[derive(Debug, Clone)]
pub struct WeatherTool {
    service: Arc<dyn WeatherService>,
}

impl WeatherTool {
    pub fn new(service: Arc<dyn WeatherService>) -> Self {
        Self { service }
    }

    pub async fn get_current_weather(&self, city: &str, country_code: Option<&str>) -> String {
        guarded(ToolName::CurrentWeather, async {
            let Some(at) = self.locate(city, country_code).await else {
                return not_found(city, country_code);
            };

            self.service
                .current_weather(at.lat, at.lon)
                .await
                .unwrap_or_else(|| "Could not fetch weather.".to_string())
        })
        .await
    }

    pub async fn get_weather_forecast(&self, city: &str, country_code: Option<&str>) -> String {
        guarded(ToolName::Forecast, async {
            let Some(at) = self.locate(city, country_code).await else {
                return not_found(city, country_code);
            };

            self.service.forecast(at.lat, at.lon).await
        })
        .await
    }

    pub async fn get_weather_alerts(&self, city: &str, country_code: Option<&str>) -> String {
        guarded(ToolName::Alerts, async {
            let Some(at) = self.locate(city, country_code).await else {
                return not_found(city, country_code);
            };

            self.service.alerts(at.lat, at.lon).await
        })
        .await
    }

    async fn locate(&self, city: &str, country_code: Option<&str>) -> Option<Coordinate> {
        self.service.resolve_coordinates(city, country_code).await
    }
}

fn not_found(city: &str, country_code: Option<&str>) -> String {
    format!("Could not find coordinates for {city}, {}.", country_code.unwrap_or("null"))
}

/// Run a tool body, converting a panic into the tool's apology string.
async fn guarded<F>(tool: ToolName, body: F) -> String
where
    F: Future<Output = String>,
{
    match AssertUnwindSafe(body).catch_unwind().await {
        Ok(output) => output,
        Err(payload) => {
            tracing::error!(tool = %tool, "Tool invocation failed: {}", panic_message(&*payload));
            tool.apology().to_string()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeService {
        coordinate: Option<Coordinate>,
        current: Option<String>,
        panics: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeService {
        fn located() -> Self {
            Self {
                coordinate: Some(Coordinate { lat: 51.5074, lon: 0.1278 }),
                current: Some("Current weather: 20°C, Sunny".to_string()),
                ..Self::default()
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().expect("calls lock").push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl WeatherService for FakeService {
        async fn resolve_coordinates(
            &self,
            city: &str,
            country_code: Option<&str>,
        ) -> Option<Coordinate> {
            self.record(format!("resolve {city} {country_code:?}"));
            self.coordinate
        }

        async fn current_weather(&self, lat: f64, lon: f64) -> Option<String> {
            self.record(format!("current {lat} {lon}"));
            if self.panics {
                panic!("current exploded");
            }
            self.current.clone()
        }

        async fn forecast(&self, lat: f64, lon: f64) -> String {
            self.record(format!("forecast {lat} {lon}"));
            if self.panics {
                panic!("forecast exploded");
            }
            "Weather forecast:\n".to_string()
        }

        async fn alerts(&self, lat: f64, lon: f64) -> String {
            self.record(format!("alerts {lat} {lon}"));
            if self.panics {
                panic!("{}", String::from("alerts exploded"));
            }
            "No weather alerts for this location.".to_string()
        }
    }

    fn tool_with(service: FakeService) -> (WeatherTool, Arc<FakeService>) {
        let service = Arc::new(service);
        (WeatherTool::new(service.clone()), service)
    }

    #[tokio::test]
    async fn unresolved_city_reports_null_country() {
        let (tool, service) = tool_with(FakeService::default());

        assert_eq!(
            tool.get_current_weather("Atlantis", None).await,
            "Could not find coordinates for Atlantis, null."
        );
        assert_eq!(service.calls(), vec!["resolve Atlantis None"]);
    }

    #[tokio::test]
    async fn unresolved_city_reports_country_code() {
        let (tool, service) = tool_with(FakeService::default());

        assert_eq!(
            tool.get_weather_forecast("Atlantis", Some("GR")).await,
            "Could not find coordinates for Atlantis, GR."
        );
        assert_eq!(
            tool.get_weather_alerts("Atlantis", Some("GR")).await,
            "Could not find coordinates for Atlantis, GR."
        );
        assert!(service.calls().iter().all(|call| call.starts_with("resolve")));
    }

    #[tokio::test]
    async fn resolved_city_delegates_with_coordinates() {
        let (tool, service) = tool_with(FakeService::located());

        assert_eq!(
            tool.get_current_weather("London", Some("UK")).await,
            "Current weather: 20°C, Sunny"
        );
        assert_eq!(
            service.calls(),
            vec!["resolve London Some(\"UK\")", "current 51.5074 0.1278"]
        );
    }

    #[tokio::test]
    async fn absent_current_weather_gets_fallback() {
        let (tool, _) = tool_with(FakeService { current: None, ..FakeService::located() });

        assert_eq!(tool.get_current_weather("London", None).await, "Could not fetch weather.");
    }

    #[tokio::test]
    async fn forecast_and_alerts_pass_through() {
        let (tool, _) = tool_with(FakeService::located());

        assert_eq!(tool.get_weather_forecast("London", None).await, "Weather forecast:\n");
        assert_eq!(
            tool.get_weather_alerts("London", None).await,
            "No weather alerts for this location."
        );
    }

    #[tokio::test]
    async fn panics_become_apologies() {
        let (tool, _) = tool_with(FakeService { panics: true, ..FakeService::located() });

        assert_eq!(
            tool.get_current_weather("London", None).await,
            "An error occurred while fetching weather."
        );
        assert_eq!(
            tool.get_weather_forecast("London", None).await,
            "An error occurred while fetching weather forecast."
        );
        assert_eq!(
            tool.get_weather_alerts("London", None).await,
            "An error occurred while fetching weather alerts."
        );
    }

    mod against_provider {
        use super::*;
        use crate::{
            config::{ApiKey, Endpoints},
            provider::OpenWeatherResolver,
        };
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn tool_for(server: &MockServer) -> WeatherTool {
            let resolver = OpenWeatherResolver::new(
                ApiKey::new("testapikey"),
                Endpoints::with_base(&server.uri()),
            );
            WeatherTool::new(Arc::new(resolver))
        }

        async fn geocode_london(server: &MockServer) {
            Mock::given(method("GET"))
                .and(path("/geo/1.0/direct"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(r#"[{"lat":51.5074,"lon":0.1278}]"#),
                )
                .expect(1)
                .mount(server)
                .await;
        }

        #[tokio::test]
        async fn geocoding_outage_reads_as_not_found() {
            let server = MockServer::start().await;
            Mock::given(path("/geo/1.0/direct"))
                .respond_with(ResponseTemplate::new(500))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(path("/data/3.0/onecall"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;

            assert_eq!(
                tool_for(&server).get_current_weather("London", None).await,
                "Could not find coordinates for London, null."
            );
        }

        #[tokio::test]
        async fn full_current_weather_flow() {
            let server = MockServer::start().await;
            geocode_london(&server).await;
            Mock::given(path("/data/3.0/onecall"))
                .respond_with(ResponseTemplate::new(200).set_body_string(
                    r#"{"current":{"temp":11.5,"weather":[{"description":"light rain"}]}}"#,
                ))
                .expect(1)
                .mount(&server)
                .await;

            assert_eq!(
                tool_for(&server).get_current_weather("London", None).await,
                "Current weather: 11.5°C, light rain"
            );
        }

        #[tokio::test]
        async fn malformed_data_responses_become_fallbacks() {
            let server = MockServer::start().await;
            Mock::given(path("/geo/1.0/direct"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(r#"[{"lat":51.5074,"lon":0.1278}]"#),
                )
                .expect(3)
                .mount(&server)
                .await;
            Mock::given(path("/data/3.0/onecall"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
                .expect(2)
                .mount(&server)
                .await;
            Mock::given(path("/data/2.5/forecast"))
                .respond_with(ResponseTemplate::new(500))
                .expect(1)
                .mount(&server)
                .await;

            let tool = tool_for(&server);
            assert_eq!(tool.get_current_weather("London", None).await, "Could not fetch weather.");
            assert_eq!(
                tool.get_weather_forecast("London", None).await,
                "Could not fetch weather forecast."
            );
            assert_eq!(
                tool.get_weather_alerts("London", None).await,
                "Could not fetch weather alerts."
            );
        }
    }
}
