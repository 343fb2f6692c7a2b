// Helpers over the generated routeguide messages.
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::routeguide::{Feature, Point, Rectangle, RouteNote, RouteSummary};

/// Coordinates are stored as degrees multiplied by 10^7.
pub const COORD_FACTOR: f64 = 1e7;

const EARTH_RADIUS_METRES: f64 = 6_371_000.0;

impl Hash for Point {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.latitude.hash(state);
        self.longitude.hash(state);
    }
}

impl Eq for Point {}

impl Point {
    pub fn new(latitude: i32, longitude: i32) -> Self {
        Point {
            latitude,
            longitude,
        }
    }

    pub fn latitude_degrees(&self) -> f64 {
        self.latitude as f64 / COORD_FACTOR
    }

    pub fn longitude_degrees(&self) -> f64 {
        self.longitude as f64 / COORD_FACTOR
    }

    /// Calculates the distance to `other` in metres using the "haversine"
    /// formula, see http://www.movable-type.co.uk/scripts/latlong.html.
    pub fn distance_to(&self, other: &Point) -> i32 {
        let lat1 = self.latitude_degrees();
        let lat2 = other.latitude_degrees();
        let lng1 = self.longitude_degrees();
        let lng2 = other.longitude_degrees();

        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2f64).sin().powi(2)
            + lat1.to_radians().cos() * lat2.to_radians().cos() * (delta_lng / 2f64).sin().powi(2);
        let c = 2f64 * a.sqrt().atan2((1f64 - a).sqrt());

        (EARTH_RADIUS_METRES * c) as i32
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.7}, {:.7}",
            self.latitude_degrees(),
            self.longitude_degrees()
        )
    }
}

impl Rectangle {
    pub fn new(lo: Point, hi: Point) -> Self {
        Rectangle {
            lo: Some(lo),
            hi: Some(hi),
        }
    }

    /// Whether `point` lies inside the rectangle, boundary included. The
    /// corners may be given in any order. A rectangle missing a corner
    /// contains nothing.
    pub fn contains(&self, point: &Point) -> bool {
        use std::cmp::{max, min};

        let (lo, hi) = match (self.lo.as_ref(), self.hi.as_ref()) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return false,
        };

        let left = min(lo.longitude, hi.longitude);
        let right = max(lo.longitude, hi.longitude);
        let bottom = min(lo.latitude, hi.latitude);
        let top = max(lo.latitude, hi.latitude);

        point.longitude >= left
            && point.longitude <= right
            && point.latitude >= bottom
            && point.latitude <= top
    }
}

impl Feature {
    /// An empty name marks "no feature here".
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

impl RouteNote {
    pub fn new(message: impl Into<String>, latitude: i32, longitude: i32) -> Self {
        RouteNote {
            message: message.into(),
            location: Some(Point::new(latitude, longitude)),
        }
    }
}

impl fmt::Display for RouteNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "\"{}\" at {}", self.message, location),
            None => write!(f, "\"{}\" at unknown location", self.message),
        }
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished trip with {} points. Passed {} features. Travelled {} meters. It took {} seconds.",
            self.point_count, self.feature_count, self.distance, self.elapsed_time
        )
    }
}
