//! Accommodation Tool
//!
//! Campsites, hostels and hotels near a stop.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use agent_core::{AgentError, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use crate::catalog::TravelCatalog;
use crate::model::AccommodationKind;

/// Tool for finding places to stay
pub struct AccommodationTool {
    catalog: Arc<dyn TravelCatalog>,
}

impl AccommodationTool {
    pub const NAME: &'static str = "find_accommodation";

    pub fn new(catalog: Arc<dyn TravelCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for AccommodationTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Find accommodation options near a location. Can filter by type (camping, hostel, hotel) and returns details including price, amenities, and ratings.".into(),
            parameters: vec![
                ParameterSchema::required("location", "string", "City or area to search for accommodation"),
                ParameterSchema::optional("type", "string", "Type of accommodation preferred")
                    .with_enum(&["camping", "hostel", "hotel", "any"])
                    .with_default(json!("any")),
                ParameterSchema::optional("max_distance_km", "number", "Maximum distance from route in kilometers"),
            ],
            category: Some("lodging".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let location = call.str_arg("location")?;
        let kind = AccommodationKind::parse_filter(call.optional_str("type"))
            .map_err(|e| e.for_tool(Self::NAME, "type"))?;

        let max_distance = call.optional_f64("max_distance_km");
        if max_distance.is_some_and(|d| !d.is_finite() || d < 0.0) {
            return Err(AgentError::invalid_argument(
                Self::NAME,
                "max_distance_km",
                "must not be negative",
            ));
        }

        let stays = self.catalog.accommodation(location, kind, max_distance);
        tracing::debug!(location, found = stays.len(), "Accommodation search");

        Ok(call.success(serde_json::to_value(&stays)?))
    }
}
