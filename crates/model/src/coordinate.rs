use std::{error, fmt};

use schemars::{gen::SchemaGenerator, schema::Schema, JsonSchema};
use serde::{Deserialize, Serialize};
use utility::geo;

/// A geographic position. Stored and transmitted as a `[longitude, latitude]`
/// pair, the order geojson and the routing provider use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Builds a coordinate from an untrusted `[longitude, latitude]` slice.
    pub fn try_from_slice(pair: &[f64]) -> Result<Self, CoordinateError> {
        let [longitude, latitude] = pair else {
            return Err(CoordinateError::Arity(pair.len()));
        };
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-180.0..=180.0).contains(longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(*longitude));
        }
        if !(-90.0..=90.0).contains(latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(*latitude));
        }
        Ok(Self::new(*longitude, *latitude))
    }

    /// Shifts the coordinate by the given amount of degrees.
    pub fn offset(self, longitude: f64, latitude: f64) -> Self {
        Self::new(self.longitude + longitude, self.latitude + latitude)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self::new(longitude, latitude)
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.longitude, value.latitude]
    }
}

impl JsonSchema for Coordinate {
    fn schema_name() -> String {
        "Coordinate".to_owned()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <[f64; 2]>::json_schema(gen)
    }
}

/// Haversine length of a path in kilometers.
pub fn path_length_km(path: &[Coordinate]) -> f64 {
    geo::path_length_km(path.iter().map(|c| (c.longitude, c.latitude)))
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateError {
    Arity(usize),
    NotFinite,
    LongitudeOutOfRange(f64),
    LatitudeOutOfRange(f64),
}

impl error::Error for CoordinateError {}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Arity(len) => {
                write!(f, "expected a [longitude, latitude] pair, got {len} values")
            }
            Self::NotFinite => write!(f, "coordinates must be finite numbers"),
            Self::LongitudeOutOfRange(v) => {
                write!(f, "longitude {v} is outside of [-180, 180]")
            }
            Self::LatitudeOutOfRange(v) => {
                write!(f, "latitude {v} is outside of [-90, 90]")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    TooShort(usize),
    InvalidPoint {
        index: usize,
        cause: CoordinateError,
    },
}

impl error::Error for PathError {}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TooShort(len) => {
                write!(f, "a path needs at least 2 points, got {len}")
            }
            Self::InvalidPoint { index, cause } => write!(f, "point {index}: {cause}"),
        }
    }
}

/// Parses an untrusted list of `[longitude, latitude]` pairs into a path of at
/// least two points.
pub fn parse_path(raw: &[Vec<f64>]) -> Result<Vec<Coordinate>, PathError> {
    if raw.len() < 2 {
        return Err(PathError::TooShort(raw.len()));
    }
    raw.iter()
        .enumerate()
        .map(|(index, pair)| {
            Coordinate::try_from_slice(pair)
                .map_err(|cause| PathError::InvalidPoint { index, cause })
        })
        .collect()
}
