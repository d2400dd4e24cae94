//! # trip-planner
//!
//! Multi-day cycling trip planning tools for the agent: routes,
//! accommodation, weather, terrain and points of interest.
//!
//! ## Example: Amsterdam to Copenhagen
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  680 km at 80 km/day → 8 days                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Amsterdam ──▶ Bremen ──▶ Hamburg ──▶ Lübeck ──▶ Copenhagen │
//! │            easy        easy      moderate   moderate        │
//! │            camping €15 hostel €32 hostel €30                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All answers come from a [`TravelCatalog`]; the bundled [`MockCatalog`]
//! is deterministic, so every tool is idempotent.

pub mod catalog;
pub mod error;
pub mod model;
pub mod svckit;

use std::sync::Arc;

use agent_core::{Result, ToolRegistry};

pub use catalog::{MockCatalog, TravelCatalog};
pub use error::PlannerError;
pub use model::{
    Accommodation, AccommodationKind, Difficulty, ElevationProfile, Month, PoiKind, PointOfInterest, RouteInfo,
    WeatherInfo,
};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        AccommodationTool, ElevationProfileTool, PointsOfInterestTool, RouteTool, WeatherTool,
    };
}

/// Registry holding the five planning tools over `catalog`
pub fn registry_with(catalog: Arc<dyn TravelCatalog>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(tools::RouteTool::new(catalog.clone()))?;
    registry.register(tools::AccommodationTool::new(catalog.clone()))?;
    registry.register(tools::WeatherTool::new(catalog.clone()))?;
    registry.register(tools::ElevationProfileTool::new(catalog.clone()))?;
    registry.register(tools::PointsOfInterestTool::new(catalog))?;

    tracing::debug!(tools = ?registry.names(), "Trip planner tools registered");
    Ok(registry)
}

/// Registry over the bundled mock catalog
pub fn registry() -> Result<ToolRegistry> {
    registry_with(Arc::new(MockCatalog::new()))
}

/// System prompt for the trip planner agent
pub const TRIP_PLANNER_PROMPT: &str = r"You are an expert cycling trip planner assistant. Your role is to help users plan multi-day cycling adventures by:

1. Understanding their preferences (distance, accommodation, timeline, interests)
2. Using available tools to gather route, weather, accommodation, and terrain information
3. Creating detailed day-by-day itineraries
4. Adjusting plans based on user feedback

## Guidelines

- Ask clarifying questions if important information is missing (dates, fitness level, budget constraints)
- Consider weather, terrain difficulty, and rest days in your planning
- Suggest realistic daily distances based on terrain and user fitness
- Always provide accommodation options that match user preferences
- Include practical tips about packing, route conditions, and points of interest
- Be conversational and encouraging - cycling trips should be exciting!

## Tools Available

- `get_route` - Route info, distance, waypoints between cities
- `find_accommodation` - Camping, hostels, or hotels along the route
- `get_weather` - Typical weather for locations and months
- `get_elevation_profile` - Terrain difficulty and elevation
- `get_points_of_interest` - Interesting places to visit

## When Presenting a Trip Plan

- Break it into clear daily segments
- Include distances, accommodation, and highlights for each day
- Provide cost estimates
- Mention weather considerations
- Suggest packing based on conditions

Be proactive in using tools to provide comprehensive answers.";
