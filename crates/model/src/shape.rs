use std::{error, fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    coordinate::Coordinate,
    route::TravelMode,
    ExampleData,
};

/// Distance used for generated shapes when the request names none.
pub const DEFAULT_DISTANCE_M: f64 = 1000.0;

/// A generative primitive a path can be synthesized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Square,
    Triangle,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Triangle => "triangle",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = UnsupportedShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "square" => Ok(Self::Square),
            "triangle" => Ok(Self::Triangle),
            other => Err(UnsupportedShapeError(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedShapeError(pub String);

impl error::Error for UnsupportedShapeError {}

impl fmt::Display for UnsupportedShapeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unsupported shape: {}", self.0)
    }
}

/// Where the path of a request comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeSource {
    /// A path drawn by the user.
    Geometry(Vec<Coordinate>),
    /// A shape generated around the user's location.
    Generated {
        start: Coordinate,
        shape: ShapeKind,
        distance_m: f64,
    },
}

/// A validated request to shape and snap a route.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRequest {
    pub source: ShapeSource,
    pub mode: TravelMode,
}

impl ShapeRequest {
    pub fn geometry(path: Vec<Coordinate>, mode: TravelMode) -> Self {
        Self {
            source: ShapeSource::Geometry(path),
            mode,
        }
    }

    pub fn generated(
        start: Coordinate,
        shape: ShapeKind,
        distance_m: f64,
        mode: TravelMode,
    ) -> Self {
        Self {
            source: ShapeSource::Generated {
                start,
                shape,
                distance_m,
            },
            mode,
        }
    }
}

/// The shape request as it arrives over the wire, before validation.
/// Coordinates are `[longitude, latitude]` pairs, `start` included.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ShapeInput {
    pub geometry: Option<Vec<Vec<f64>>>,
    pub start: Option<Vec<f64>>,
    pub shape: Option<String>,
    /// meters
    pub distance: Option<f64>,
    pub mode: Option<String>,
    pub name: Option<String>,
    /// An already snapped version of `geometry`. When given, the route is
    /// stored as is and the routing provider is not asked.
    pub snapped_route: Option<Vec<Vec<f64>>>,
}

impl ExampleData for ShapeInput {
    fn example_data() -> Self {
        Self {
            start: Some(vec![10.1349, 54.3233]),
            shape: Some("square".to_owned()),
            distance: Some(DEFAULT_DISTANCE_M),
            mode: Some("foot-walking".to_owned()),
            name: Some("Morning loop".to_owned()),
            ..Default::default()
        }
    }
}
