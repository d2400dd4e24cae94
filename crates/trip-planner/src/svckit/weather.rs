//! Weather Tool
//!
//! Typical climate for a place and month, with a cycling verdict.

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use crate::catalog::TravelCatalog;
use crate::model::Month;

/// Tool for climate lookups
pub struct WeatherTool {
    catalog: Arc<dyn TravelCatalog>,
}

impl WeatherTool {
    pub const NAME: &'static str = "get_weather";

    pub fn new(catalog: Arc<dyn TravelCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Get typical weather information for a location and month, including temperature, precipitation, and cycling suitability assessment.".into(),
            parameters: vec![
                ParameterSchema::required("location", "string", "City or region name"),
                ParameterSchema::required("month", "string", "Month name (e.g., 'June', 'September')"),
            ],
            category: Some("weather".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let location = call.str_arg("location")?;
        let month = call
            .str_arg("month")?
            .parse::<Month>()
            .map_err(|e| e.for_tool(Self::NAME, "month"))?;

        let weather = self.catalog.weather(location, month);
        Ok(call.success(serde_json::to_value(&weather)?))
    }
}
