//! Travel Catalog
//!
//! Source of route, lodging, climate and terrain data for the tools.

mod mock;

pub use mock::MockCatalog;

use crate::model::{
    Accommodation, AccommodationKind, ElevationProfile, Month, PoiKind, PointOfInterest, RouteInfo,
    WeatherInfo,
};

/// Travel data source (Strategy pattern)
///
/// Every lookup is a pure function of its inputs: asking twice gives the
/// same answer, which keeps the tools idempotent.
pub trait TravelCatalog: Send + Sync {
    /// Route between two cities. `days` fixes the trip length; otherwise it is
    /// derived from `daily_distance_km`.
    fn route(&self, origin: &str, destination: &str, days: Option<u32>, daily_distance_km: f64) -> RouteInfo;

    /// Places to stay near a location
    fn accommodation(
        &self,
        location: &str,
        kind: Option<AccommodationKind>,
        max_distance_km: Option<f64>,
    ) -> Vec<Accommodation>;

    /// Typical weather for a location in a month
    fn weather(&self, location: &str, month: Month) -> WeatherInfo;

    /// Terrain between two points
    fn elevation(&self, start: &str, end: &str) -> ElevationProfile;

    /// Sights near a location
    fn points_of_interest(&self, location: &str, kind: Option<PoiKind>) -> Vec<PointOfInterest>;

    /// Catalog name
    fn name(&self) -> &str;
}
