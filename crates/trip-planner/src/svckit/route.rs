//! Route Tool
//!
//! Distance, duration and waypoints between two cities.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use agent_core::{AgentError, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use crate::catalog::TravelCatalog;

/// Default kilometres per day when neither `days` nor a pace is given
pub const DEFAULT_DAILY_DISTANCE_KM: f64 = 80.0;

/// Tool for cycling route lookups
pub struct RouteTool {
    catalog: Arc<dyn TravelCatalog>,
}

impl RouteTool {
    pub const NAME: &'static str = "get_route";

    pub fn new(catalog: Arc<dyn TravelCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for RouteTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Get cycling route information between two cities including distance, estimated days, and waypoints. Returns detailed route data for planning multi-day trips.".into(),
            parameters: vec![
                ParameterSchema::required("origin", "string", "Starting city name"),
                ParameterSchema::required("destination", "string", "Destination city name"),
                ParameterSchema::optional("days", "integer", "Number of cycling days, if the rider has fixed it"),
                ParameterSchema::optional("daily_distance_km", "number", "Average daily cycling distance in kilometers")
                    .with_default(json!(DEFAULT_DAILY_DISTANCE_KM)),
            ],
            category: Some("route".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let origin = call.str_arg("origin")?;
        let destination = call.str_arg("destination")?;

        let days = match call.optional_u64("days") {
            None => None,
            Some(0) => return Err(AgentError::invalid_argument(Self::NAME, "days", "must be at least 1")),
            Some(d) => Some(
                u32::try_from(d).map_err(|_| AgentError::invalid_argument(Self::NAME, "days", "is too large"))?,
            ),
        };

        let daily = call.optional_f64("daily_distance_km").unwrap_or(DEFAULT_DAILY_DISTANCE_KM);
        if !daily.is_finite() || daily <= 0.0 {
            return Err(AgentError::invalid_argument(
                Self::NAME,
                "daily_distance_km",
                "must be greater than 0",
            ));
        }

        let route = self.catalog.route(origin, destination, days, daily);
        tracing::debug!(
            origin = %route.origin,
            destination = %route.destination,
            distance_km = route.distance_km,
            "Route resolved"
        );

        Ok(call.success(serde_json::to_value(&route)?))
    }
}
