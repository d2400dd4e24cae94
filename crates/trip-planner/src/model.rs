//! Domain Models
//!
//! Plain records returned by the planning tools. Prices use `rust_decimal`;
//! distances and temperatures are measurements and stay `f64`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;

/// Cycling route between two cities
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub origin: String,
    pub destination: String,

    /// Total distance in kilometres
    pub distance_km: f64,

    /// Days in the saddle
    pub estimated_days: u32,

    /// Average distance per day at `estimated_days`
    pub daily_distance_km: f64,

    /// Cities passed through, origin and destination included
    pub waypoints: Vec<String>,

    pub description: String,
}

/// Kind of overnight stay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccommodationKind {
    Camping,
    Hostel,
    Hotel,
}

impl AccommodationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Camping => "camping",
            Self::Hostel => "hostel",
            Self::Hotel => "hotel",
        }
    }

    /// Parse a filter value; `"any"` means no filter
    pub fn parse_filter(value: Option<&str>) -> Result<Option<Self>, PlannerError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(other) if other.eq_ignore_ascii_case("any") => Ok(None),
            Some(other) => other.parse().map(Some),
        }
    }
}

impl FromStr for AccommodationKind {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "camping" => Ok(Self::Camping),
            "hostel" => Ok(Self::Hostel),
            "hotel" => Ok(Self::Hotel),
            _ => Err(PlannerError::UnknownAccommodationKind(s.to_string())),
        }
    }
}

/// A place to sleep near the route
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: AccommodationKind,

    pub location: String,

    /// Nightly price in EUR
    pub price_per_night: Decimal,

    pub distance_from_route_km: f64,

    pub amenities: Vec<String>,

    /// Guest rating out of 5
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Calendar month
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Self; 12] = [
        Self::January,
        Self::February,
        Self::March,
        Self::April,
        Self::May,
        Self::June,
        Self::July,
        Self::August,
        Self::September,
        Self::October,
        Self::November,
        Self::December,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::January => "January",
            Self::February => "February",
            Self::March => "March",
            Self::April => "April",
            Self::May => "May",
            Self::June => "June",
            Self::July => "July",
            Self::August => "August",
            Self::September => "September",
            Self::October => "October",
            Self::November => "November",
            Self::December => "December",
        }
    }
}

impl FromStr for Month {
    type Err = PlannerError;

    /// English month names in any case, abbreviated to at least three
    /// letters ("Sep", "Sept"), possibly inside a phrase ("mid-June")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        lowered
            .split(|c: char| !c.is_alphabetic())
            .filter(|word| word.chars().count() >= 3)
            .find_map(|word| {
                Self::ALL
                    .into_iter()
                    .find(|m| m.name().to_lowercase().starts_with(word))
            })
            .ok_or_else(|| PlannerError::UnknownMonth(s.to_string()))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typical climate for a place and month
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    pub location: String,
    pub month: String,
    pub avg_temp_high: f64,
    pub avg_temp_low: f64,
    pub precipitation_mm: f64,
    pub conditions: String,
    pub cycling_suitability: String,
}

/// Terrain difficulty rating
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
    Difficult,
}

impl Difficulty {
    pub const fn description(self) -> &'static str {
        match self {
            Self::Easy => "Mostly flat terrain with gentle rolling hills",
            Self::Moderate => "Some hills with moderate climbs, manageable for most cyclists",
            Self::Challenging => "Significant elevation changes with steep sections",
            Self::Difficult => "Very hilly terrain with long, steep climbs",
        }
    }
}

/// Climbing and descending on one segment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElevationProfile {
    /// Segment label, "start to end"
    pub location: String,
    pub total_elevation_gain_m: f64,
    pub total_elevation_loss_m: f64,
    pub max_elevation_m: f64,
    pub difficulty_rating: Difficulty,
    pub description: String,
}

/// Point of interest category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiKind {
    Historical,
    Scenic,
    Cultural,
    Food,
}

impl PoiKind {
    /// Parse a filter value; `"any"` means no filter
    pub fn parse_filter(value: Option<&str>) -> Result<Option<Self>, PlannerError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(other) if other.eq_ignore_ascii_case("any") => Ok(None),
            Some(other) => other.parse().map(Some),
        }
    }
}

impl FromStr for PoiKind {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "historical" => Ok(Self::Historical),
            "scenic" => Ok(Self::Scenic),
            "cultural" => Ok(Self::Cultural),
            "food" => Ok(Self::Food),
            _ => Err(PlannerError::UnknownPoiKind(s.to_string())),
        }
    }
}

/// Something worth a stop along the way
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: PoiKind,

    pub location: String,
    pub description: String,
    pub distance_from_route_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_parsing() {
        assert_eq!("June".parse::<Month>().unwrap(), Month::June);
        assert_eq!(" september ".parse::<Month>().unwrap(), Month::September);
        assert_eq!("SEP".parse::<Month>().unwrap(), Month::September);
        assert_eq!(
            "Juneuary".parse::<Month>(),
            Err(PlannerError::UnknownMonth("Juneuary".into()))
        );
        assert!("ju".parse::<Month>().is_err());
    }

    #[test]
    fn test_month_abbreviations_and_phrases() {
        assert_eq!("Sept".parse::<Month>().unwrap(), Month::September);
        assert_eq!("mid-June".parse::<Month>().unwrap(), Month::June);
        assert_eq!("early March".parse::<Month>().unwrap(), Month::March);
        assert_eq!("Jul".parse::<Month>().unwrap(), Month::July);
        assert!("late summer".parse::<Month>().is_err());
    }

    #[test]
    fn test_filters_treat_any_as_none() {
        assert_eq!(AccommodationKind::parse_filter(Some("any")).unwrap(), None);
        assert_eq!(AccommodationKind::parse_filter(None).unwrap(), None);
        assert_eq!(
            AccommodationKind::parse_filter(Some("hostel")).unwrap(),
            Some(AccommodationKind::Hostel)
        );
        assert_eq!(PoiKind::parse_filter(Some("Any")).unwrap(), None);
        assert!(PoiKind::parse_filter(Some("nightlife")).is_err());
    }

    #[test]
    fn test_accommodation_wire_shape() {
        let stay = Accommodation {
            name: "Bremen City Camping".into(),
            kind: AccommodationKind::Camping,
            location: "Bremen".into(),
            price_per_night: Decimal::new(15, 0),
            distance_from_route_km: 1.5,
            amenities: vec!["showers".into()],
            rating: None,
        };
        let json = serde_json::to_value(&stay).unwrap();

        assert_eq!(json["type"], "camping");
        assert_eq!(json["price_per_night"], "15");
        assert!(json.get("rating").is_none());
    }
}
