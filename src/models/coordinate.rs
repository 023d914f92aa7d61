use std::fmt;

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

use super::error::SyncError;

/// A point on the map, in degrees.
///
/// Only constructible through [`Coordinate::new`], so every value in
/// circulation satisfies the latitude/longitude range invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting anything outside valid GPS ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SyncError> {
        let in_range = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);

        // NaN fails both range checks
        if !in_range {
            return Err(SyncError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to another coordinate in meters
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let p1 = Point::new(self.longitude, self.latitude);
        let p2 = Point::new(other.longitude, other.latitude);

        p1.haversine_distance(&p2)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            latitude: f64,
            longitude: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Coordinate::new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}

/// Position exactly as a map widget reports it, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl TryFrom<LatLng> for Coordinate {
    type Error = SyncError;

    fn try_from(value: LatLng) -> Result<Self, Self::Error> {
        Coordinate::new(value.lat, value.lng)
    }
}

impl From<Coordinate> for LatLng {
    fn from(value: Coordinate) -> Self {
        Self::new(value.latitude, value.longitude)
    }
}

/// Which of the two markers moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    Source,
    Target,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Source => write!(f, "source"),
            EndpointRole::Target => write!(f, "target"),
        }
    }
}

/// The line currently drawn between the markers.
///
/// Always has a start and an end; a path service may add vertices in between.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    points: Vec<Coordinate>,
}

impl Path {
    /// Build a path from an ordered list of points (at least two)
    pub fn new(points: Vec<Coordinate>) -> Result<Self, SyncError> {
        if points.len() < 2 {
            return Err(SyncError::MalformedResponse(format!(
                "a path needs at least 2 points, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// The straight line between two endpoints
    pub fn direct(source: Coordinate, target: Coordinate) -> Self {
        Self {
            points: vec![source, target],
        }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn start(&self) -> Coordinate {
        self.points[0]
    }

    pub fn end(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }

    /// Sum of the segment lengths in meters
    pub fn length_meters(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }
}
