//! Points of Interest Tool

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use crate::catalog::TravelCatalog;
use crate::model::PoiKind;

/// Tool for finding sights along the way
pub struct PointsOfInterestTool {
    catalog: Arc<dyn TravelCatalog>,
}

impl PointsOfInterestTool {
    pub const NAME: &'static str = "get_points_of_interest";

    pub fn new(catalog: Arc<dyn TravelCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for PointsOfInterestTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Find interesting places to visit along the route such as historical sites, scenic viewpoints, or local attractions.".into(),
            parameters: vec![
                ParameterSchema::required("location", "string", "City or area to search"),
                ParameterSchema::optional("type", "string", "Type of point of interest")
                    .with_enum(&["historical", "scenic", "cultural", "food", "any"])
                    .with_default(json!("any")),
            ],
            category: Some("sightseeing".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let location = call.str_arg("location")?;
        let kind = PoiKind::parse_filter(call.optional_str("type")).map_err(|e| e.for_tool(Self::NAME, "type"))?;

        let pois = self.catalog.points_of_interest(location, kind);
        Ok(call.success(serde_json::to_value(&pois)?))
    }
}
