//! Mock Travel Catalog
//!
//! Static tables for a handful of North-European cities plus deterministic
//! generated answers for everywhere else.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::TravelCatalog;
use crate::model::{
    Accommodation, AccommodationKind, Difficulty, ElevationProfile, Month, PoiKind, PointOfInterest,
    RouteInfo, WeatherInfo,
};

/// Road distance is longer than the great-circle distance
const ROAD_FACTOR: f64 = 1.2;

const EARTH_RADIUS_KM: f64 = 6371.0;

const DISTANCE_FROM_ROUTE_KM: f64 = 1.5;

struct KnownRoute {
    from: &'static str,
    to: &'static str,
    distance_km: f64,
    waypoints: &'static [&'static str],
    description: &'static str,
}

const ROUTES: &[KnownRoute] = &[
    KnownRoute {
        from: "amsterdam",
        to: "copenhagen",
        distance_km: 680.0,
        waypoints: &["Amsterdam", "Bremen", "Hamburg", "Lübeck", "Copenhagen"],
        description: "Classic North Sea route through Netherlands and Germany",
    },
    KnownRoute {
        from: "amsterdam",
        to: "bruges",
        distance_km: 230.0,
        waypoints: &["Amsterdam", "Rotterdam", "Antwerp", "Bruges"],
        description: "Flat coastal route through Netherlands and Belgium",
    },
    KnownRoute {
        from: "paris",
        to: "amsterdam",
        distance_km: 520.0,
        waypoints: &["Paris", "Amiens", "Lille", "Brussels", "Antwerp", "Amsterdam"],
        description: "Route through northern France, Belgium, and Netherlands",
    },
];

/// (city, latitude, longitude)
const COORDINATES: &[(&str, f64, f64)] = &[
    ("amiens", 49.894, 2.296),
    ("amsterdam", 52.368, 4.904),
    ("antwerp", 51.219, 4.402),
    ("berlin", 52.520, 13.405),
    ("bremen", 53.079, 8.802),
    ("bruges", 51.209, 3.225),
    ("brussels", 50.850, 4.352),
    ("cologne", 50.938, 6.960),
    ("copenhagen", 55.676, 12.568),
    ("ghent", 51.054, 3.717),
    ("hamburg", 53.551, 9.994),
    ("lille", 50.629, 3.057),
    ("lübeck", 53.866, 10.687),
    ("paris", 48.857, 2.352),
    ("rotterdam", 51.924, 4.478),
    ("utrecht", 52.091, 5.122),
];

struct KnownStay {
    name: &'static str,
    kind: AccommodationKind,
    price: Decimal,
    amenities: &'static [&'static str],
    rating: f64,
}

const fn stay(
    name: &'static str,
    kind: AccommodationKind,
    price: Decimal,
    amenities: &'static [&'static str],
    rating: f64,
) -> KnownStay {
    KnownStay {
        name,
        kind,
        price,
        amenities,
        rating,
    }
}

fn known_stays(location: &str) -> Vec<KnownStay> {
    use AccommodationKind::{Camping, Hostel};

    match location {
        "bremen" => vec![
            stay("Bremen City Camping", Camping, dec!(15), &["showers", "wifi", "bike_storage"], 4.2),
            stay("Bremen Backpackers Hostel", Hostel, dec!(28), &["wifi", "kitchen", "bike_storage"], 4.5),
        ],
        "hamburg" => vec![
            stay("Hamburg Beach Camp", Camping, dec!(18), &["showers", "wifi", "laundry"], 4.0),
            stay("St. Pauli Hostel", Hostel, dec!(32), &["wifi", "bar", "bike_storage"], 4.6),
        ],
        "lübeck" => vec![
            stay("Lübeck Campsite", Camping, dec!(16), &["showers", "bike_storage"], 3.9),
            stay("Altstadt Hostel", Hostel, dec!(30), &["wifi", "kitchen", "bike_rental"], 4.4),
        ],
        _ => Vec::new(),
    }
}

/// (month, location) → (high, low, precipitation, conditions)
fn known_weather(month: Month, location: &str) -> Option<(f64, f64, f64, &'static str)> {
    match (month, location) {
        (Month::June, "amsterdam") => Some((20.0, 12.0, 68.0, "Mild with occasional rain")),
        (Month::June, "copenhagen") => Some((20.0, 11.0, 51.0, "Pleasant with light winds")),
        (Month::June, "hamburg") => Some((21.0, 12.0, 72.0, "Warm with occasional showers")),
        _ => None,
    }
}

/// "start-end" → (gain, loss, max, difficulty)
fn known_elevation(segment: &str) -> Option<(f64, f64, f64, Difficulty)> {
    match segment {
        "amsterdam-bremen" => Some((120.0, 110.0, 45.0, Difficulty::Easy)),
        "bremen-hamburg" => Some((180.0, 170.0, 65.0, Difficulty::Easy)),
        "hamburg-lübeck" => Some((240.0, 230.0, 82.0, Difficulty::Moderate)),
        "lübeck-copenhagen" => Some((350.0, 340.0, 125.0, Difficulty::Moderate)),
        _ => None,
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn char_len(s: &str) -> usize {
    s.trim().chars().count()
}

fn coordinates(city: &str) -> Option<(f64, f64)> {
    COORDINATES
        .iter()
        .find(|(name, _, _)| *name == city)
        .map(|&(_, lat, lon)| (lat, lon))
}

/// Great-circle distance in kilometres
pub fn haversine_km((lat1, lon1): (f64, f64), (lat2, lon2): (f64, f64)) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[allow(clippy::cast_precision_loss)]
fn usize_f64(n: usize) -> f64 {
    n as f64
}

/// Mock catalog with static tables
#[derive(Clone, Copy, Debug, Default)]
pub struct MockCatalog;

impl MockCatalog {
    pub const fn new() -> Self {
        Self
    }

    /// (distance, waypoints, description) for a pair of cities
    fn lookup_route(origin: &str, destination: &str) -> (f64, Vec<String>, String) {
        let (from, to) = (normalize(origin), normalize(destination));
        let origin = origin.trim();
        let destination = destination.trim();

        if let Some(route) = ROUTES.iter().find(|r| r.from == from && r.to == to) {
            let waypoints = route.waypoints.iter().map(ToString::to_string).collect();
            return (route.distance_km, waypoints, route.description.to_string());
        }

        if let Some(route) = ROUTES.iter().find(|r| r.from == to && r.to == from) {
            let waypoints = route.waypoints.iter().rev().map(ToString::to_string).collect();
            return (route.distance_km, waypoints, format!("{} (reverse direction)", route.description));
        }

        if let (Some(a), Some(b)) = (coordinates(&from), coordinates(&to)) {
            let distance = (haversine_km(a, b) * ROAD_FACTOR).round();
            return (
                distance,
                vec![origin.to_string(), destination.to_string()],
                format!("Cycling route from {origin} to {destination} on regional roads and bike paths"),
            );
        }

        let distance = usize_f64(400 + (char_len(origin) + char_len(destination)) * 10);
        (
            distance,
            vec![
                origin.to_string(),
                format!("Mid-point near {origin}"),
                destination.to_string(),
            ],
            format!("Cycling route from {origin} to {destination}"),
        )
    }
}

impl TravelCatalog for MockCatalog {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn route(&self, origin: &str, destination: &str, days: Option<u32>, daily_distance_km: f64) -> RouteInfo {
        let (distance_km, waypoints, description) = Self::lookup_route(origin, destination);

        let estimated_days = days.unwrap_or_else(|| ((distance_km / daily_distance_km).floor() as u32).max(1));

        RouteInfo {
            origin: origin.trim().to_string(),
            destination: destination.trim().to_string(),
            distance_km,
            estimated_days,
            daily_distance_km: round1(distance_km / f64::from(estimated_days)),
            waypoints,
            description,
        }
    }

    fn accommodation(
        &self,
        location: &str,
        kind: Option<AccommodationKind>,
        max_distance_km: Option<f64>,
    ) -> Vec<Accommodation> {
        let display = location.trim();
        let wanted = |s: &KnownStay| kind.is_none_or(|k| s.kind == k);
        let near = |a: &Accommodation| max_distance_km.is_none_or(|max| a.distance_from_route_km <= max);

        let to_record = |s: KnownStay| Accommodation {
            name: s.name.to_string(),
            kind: s.kind,
            location: display.to_string(),
            price_per_night: s.price,
            distance_from_route_km: DISTANCE_FROM_ROUTE_KM,
            amenities: s.amenities.iter().map(ToString::to_string).collect(),
            rating: Some(s.rating),
        };

        let stays: Vec<KnownStay> = known_stays(&normalize(location))
            .into_iter()
            .filter(|s| wanted(s))
            .collect();

        if stays.is_empty() {
            let camping = format!("{display} Campsite");
            let hostel = format!("{display} Hostel");
            let generated = [
                (camping, AccommodationKind::Camping, dec!(15), vec!["showers", "bike_storage"], 4.0),
                (hostel, AccommodationKind::Hostel, dec!(30), vec!["wifi", "kitchen", "bike_storage"], 4.3),
            ];
            return generated
                .into_iter()
                .filter(|(_, k, ..)| kind.is_none_or(|want| *k == want))
                .map(|(name, kind, price, amenities, rating)| Accommodation {
                    name,
                    kind,
                    location: display.to_string(),
                    price_per_night: price,
                    distance_from_route_km: DISTANCE_FROM_ROUTE_KM,
                    amenities: amenities.into_iter().map(String::from).collect(),
                    rating: Some(rating),
                })
                .filter(|a| near(a))
                .collect();
        }

        stays.into_iter().map(to_record).filter(|a| near(a)).collect()
    }

    fn weather(&self, location: &str, month: Month) -> WeatherInfo {
        let (high, low, precipitation, conditions) = known_weather(month, &normalize(location))
            .unwrap_or_else(|| {
                let loc_len = char_len(location);
                (
                    usize_f64(18 + loc_len % 8),
                    usize_f64(10 + month.name().len() % 6),
                    usize_f64(50 + (loc_len * 3) % 40),
                    "Generally pleasant cycling weather",
                )
            });

        let suitability = if precipitation > 80.0 {
            "Good but bring rain gear - expect wet days"
        } else if high > 25.0 {
            "Excellent - warm and mostly dry"
        } else {
            "Good - mild temperatures ideal for cycling"
        };

        WeatherInfo {
            location: location.trim().to_string(),
            month: month.name().to_string(),
            avg_temp_high: high,
            avg_temp_low: low,
            precipitation_mm: precipitation,
            conditions: conditions.to_string(),
            cycling_suitability: suitability.to_string(),
        }
    }

    fn elevation(&self, start: &str, end: &str) -> ElevationProfile {
        let segment = format!("{}-{}", normalize(start), normalize(end));
        let (gain, loss, max, difficulty) = known_elevation(&segment).unwrap_or_else(|| {
            let gain = 150 + (char_len(start) + char_len(end)) * 5;
            (
                usize_f64(gain),
                usize_f64(gain - 20),
                usize_f64(50 + gain / 3),
                Difficulty::Moderate,
            )
        });

        ElevationProfile {
            location: format!("{} to {}", start.trim(), end.trim()),
            total_elevation_gain_m: gain,
            total_elevation_loss_m: loss,
            max_elevation_m: max,
            difficulty_rating: difficulty,
            description: difficulty.description().to_string(),
        }
    }

    fn points_of_interest(&self, location: &str, kind: Option<PoiKind>) -> Vec<PointOfInterest> {
        let location = location.trim();
        let candidates = [
            (
                format!("{location} Old Town"),
                PoiKind::Historical,
                "Historic city center with medieval architecture",
                0.5,
            ),
            (
                format!("{location} Waterfront"),
                PoiKind::Scenic,
                "Beautiful waterfront area perfect for photos",
                1.0,
            ),
            (
                format!("Local Brewery near {location}"),
                PoiKind::Food,
                "Traditional brewery with local specialties",
                2.0,
            ),
        ];

        candidates
            .into_iter()
            .filter(|(_, k, ..)| kind.is_none_or(|want| *k == want))
            .map(|(name, kind, description, distance)| PointOfInterest {
                name,
                kind,
                location: location.to_string(),
                description: description.to_string(),
                distance_from_route_km: distance,
            })
            .collect()
    }

    fn name(&self) -> &str {
        "MockCatalog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_route() {
        let route = MockCatalog.route("Amsterdam", "Copenhagen", None, 80.0);
        assert_eq!(route.distance_km, 680.0);
        assert_eq!(route.estimated_days, 8);
        assert_eq!(route.waypoints.first().map(String::as_str), Some("Amsterdam"));
        assert_eq!(route.waypoints.len(), 5);
    }

    #[test]
    fn test_reverse_route_reverses_waypoints() {
        let route = MockCatalog.route("bruges", "amsterdam", Some(3), 80.0);
        assert_eq!(route.distance_km, 230.0);
        assert_eq!(route.estimated_days, 3);
        assert_eq!(route.daily_distance_km, 76.7);
        assert_eq!(route.waypoints.first().map(String::as_str), Some("Bruges"));
    }

    #[test]
    fn test_route_from_coordinates() {
        let route = MockCatalog.route("Berlin", "Hamburg", None, 80.0);
        // ~255 km great-circle, plus the road factor
        assert!(route.distance_km > 290.0 && route.distance_km < 330.0, "{}", route.distance_km);
        assert_eq!(route.waypoints, vec!["Berlin", "Hamburg"]);
    }

    #[test]
    fn test_unknown_route_formula() {
        let route = MockCatalog.route("City A", "City B", Some(3), 80.0);
        assert_eq!(route.distance_km, 520.0);
        assert_eq!(route.estimated_days, 3);
        assert_eq!(route.waypoints[1], "Mid-point near City A");

        let route = MockCatalog.route("X", "Y", None, 1000.0);
        assert_eq!(route.estimated_days, 1);
    }

    #[test]
    fn test_accommodation_table_and_filters() {
        let all = MockCatalog.accommodation("Hamburg", None, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].price_per_night, dec!(32));

        let hostels = MockCatalog.accommodation("LÜBECK", Some(AccommodationKind::Hostel), None);
        assert_eq!(hostels.len(), 1);
        assert_eq!(hostels[0].name, "Altstadt Hostel");

        assert!(MockCatalog.accommodation("Bremen", None, Some(1.0)).is_empty());
    }

    #[test]
    fn test_generated_accommodation() {
        let stays = MockCatalog.accommodation("Ghent", None, None);
        assert_eq!(stays.len(), 2);
        assert_eq!(stays[0].name, "Ghent Campsite");
        assert_eq!(stays[1].price_per_night, dec!(30));

        // Known city without hotels falls back to generated options, filtered too
        assert!(MockCatalog.accommodation("Bremen", Some(AccommodationKind::Hotel), None).is_empty());
    }

    #[test]
    fn test_weather_table_and_generated() {
        let known = MockCatalog.weather("Hamburg", Month::June);
        assert_eq!(known.avg_temp_high, 21.0);
        assert_eq!(known.cycling_suitability, "Good - mild temperatures ideal for cycling");

        let generated = MockCatalog.weather("Bruges", Month::June);
        assert_eq!(generated.avg_temp_high, 24.0);
        assert_eq!(generated.avg_temp_low, 14.0);
        assert_eq!(generated.precipitation_mm, 68.0);
    }

    #[test]
    fn test_weather_suitability_thresholds() {
        // 13 chars: precipitation 50 + 39 = 89
        let wet = MockCatalog.weather("Sankt Goarsha", Month::May);
        assert_eq!(wet.precipitation_mm, 89.0);
        assert!(wet.cycling_suitability.contains("rain gear"));
    }

    #[test]
    fn test_elevation() {
        let known = MockCatalog.elevation("Hamburg", "Lübeck");
        assert_eq!(known.difficulty_rating, Difficulty::Moderate);
        assert_eq!(known.total_elevation_gain_m, 240.0);

        let generated = MockCatalog.elevation("Ghent", "Lille");
        assert_eq!(generated.total_elevation_gain_m, 200.0);
        assert_eq!(generated.total_elevation_loss_m, 180.0);
        assert_eq!(generated.max_elevation_m, 116.0);
        assert_eq!(generated.location, "Ghent to Lille");
    }

    #[test]
    fn test_points_of_interest_filter() {
        assert_eq!(MockCatalog.points_of_interest("Ghent", None).len(), 3);

        let food = MockCatalog.points_of_interest("Ghent", Some(PoiKind::Food));
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].name, "Local Brewery near Ghent");

        assert!(MockCatalog.points_of_interest("Ghent", Some(PoiKind::Cultural)).is_empty());
    }

    #[test]
    fn test_haversine() {
        let paris = (48.857, 2.352);
        let amsterdam = (52.368, 4.904);
        let d = haversine_km(paris, amsterdam);
        assert!((d - 430.0).abs() < 10.0, "{d}");
    }
}
