//! MCP server exposing the weather tools over stdio.

use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::Deserialize;
use weather_core::WeatherTool;

/// Arguments shared by every weather tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct LocationRequest {
    /// The city name to look up
    pub city: String,

    /// Optional: Country code (e.g., 'US', 'UK')
    #[serde(default, alias = "countryCode")]
    pub country_code: Option<String>,
}

#[derive(Clone)]
pub struct WeatherServer {
    tool: WeatherTool,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WeatherServer {
    pub fn new(tool: WeatherTool) -> Self {
        Self { tool, tool_router: Self::tool_router() }
    }

    #[tool(description = "Gets current weather conditions for the specified city.")]
    async fn get_current_weather(
        &self,
        Parameters(req): Parameters<LocationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let out = self.tool.get_current_weather(&req.city, req.country_code.as_deref()).await;
        Ok(text_result(out))
    }

    #[tool(description = "Gets weather forecast for the specified city.")]
    async fn get_weather_forecast(
        &self,
        Parameters(req): Parameters<LocationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let out = self.tool.get_weather_forecast(&req.city, req.country_code.as_deref()).await;
        Ok(text_result(out))
    }

    #[tool(description = "Gets weather alerts/warnings for the specified city.")]
    async fn get_weather_alerts(
        &self,
        Parameters(req): Parameters<LocationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let out = self.tool.get_weather_alerts(&req.city, req.country_code.as_deref()).await;
        Ok(text_result(out))
    }
}

#[tool_handler]
impl ServerHandler for WeatherServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Current weather, forecasts and alerts for a city, from OpenWeatherMap.".to_string(),
            ),
            ..Default::default()
        }
    }
}

// Tool output is always a plain message, failures included.
fn text_result(out: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(out)])
}

/// Serve until the client closes stdin.
pub async fn run(tool: WeatherTool) -> anyhow::Result<()> {
    tracing::info!("Serving weather tools over MCP stdio");

    let service = WeatherServer::new(tool)
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("MCP initialization failed: {:?}", e))?;

    let reason = service.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", reason);
    Ok(())
}
