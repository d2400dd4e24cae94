//! Elevation Profile Tool
//!
//! Climbing, descending and a difficulty rating for one segment.

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use crate::catalog::TravelCatalog;

/// Tool for terrain lookups
pub struct ElevationProfileTool {
    catalog: Arc<dyn TravelCatalog>,
}

impl ElevationProfileTool {
    pub const NAME: &'static str = "get_elevation_profile";

    pub fn new(catalog: Arc<dyn TravelCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for ElevationProfileTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Get terrain difficulty and elevation information for a route segment, including total elevation gain/loss and difficulty rating.".into(),
            parameters: vec![
                ParameterSchema::required("start", "string", "Starting location"),
                ParameterSchema::required("end", "string", "Ending location"),
            ],
            category: Some("route".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let profile = self.catalog.elevation(call.str_arg("start")?, call.str_arg("end")?);
        Ok(call.success(serde_json::to_value(&profile)?))
    }
}
