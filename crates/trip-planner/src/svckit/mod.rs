//! Service Kit - Agent Tools
//!
//! Domain-specific tools that implement `agent_core::Tool` for the trip planner.

mod accommodation;
mod elevation;
mod poi;
mod route;
mod weather;

pub use accommodation::AccommodationTool;
pub use elevation::ElevationProfileTool;
pub use poi::PointsOfInterestTool;
pub use route::RouteTool;
pub use weather::WeatherTool;
