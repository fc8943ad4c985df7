use chrono::{DateTime, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utility::id::{HasId, Id};

use crate::{coordinate::Coordinate, user::User, ExampleData};

/// A routing profile of the routing provider, e.g. `foot-walking`,
/// `cycling-regular` or `driving-car`. Unsupported profiles are rejected by
/// the provider, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TravelMode(String);

impl TravelMode {
    pub const DEFAULT: &'static str = "foot-walking";

    pub fn new(profile: impl Into<String>) -> Self {
        Self(profile.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TravelMode {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One turn instruction, exactly as the routing provider produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct DirectionStep(pub Value);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SnappedRoute {
    /// The path as submitted or generated.
    #[serde(rename = "original_shape")]
    pub geometry: Vec<Coordinate>,
    /// The road aligned path.
    #[serde(rename = "snapped_route")]
    pub snapped: Vec<Coordinate>,
    #[serde(default)]
    pub directions: Vec<DirectionStep>,
    pub mode: TravelMode,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RouteRecord {
    pub user_id: Id<User>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub route: SnappedRoute,
}

impl HasId for RouteRecord {
    type IdType = i64;
}

impl RouteRecord {
    pub fn apply(&mut self, changes: RouteChanges) {
        let RouteChanges {
            name,
            mode,
            geometry,
            snapped,
            directions,
        } = changes;
        if let Some(name) = name {
            self.name = Some(name);
        }
        if let Some(mode) = mode {
            self.route.mode = mode;
        }
        if let Some(geometry) = geometry {
            self.route.geometry = geometry;
        }
        if let Some(snapped) = snapped {
            self.route.snapped = snapped;
        }
        if let Some(directions) = directions {
            self.route.directions = directions;
        }
    }
}

impl ExampleData for RouteRecord {
    fn example_data() -> Self {
        let square = vec![
            Coordinate::new(10.1349, 54.3233),
            Coordinate::new(10.1439, 54.3233),
            Coordinate::new(10.1439, 54.3323),
            Coordinate::new(10.1349, 54.3323),
            Coordinate::new(10.1349, 54.3233),
        ];
        Self {
            user_id: Id::new("3f6c1b2e".to_owned()),
            name: Some("Morning loop".to_owned()),
            created_at: Utc
                .with_ymd_and_hms(2024, 8, 1, 7, 30, 0)
                .single()
                .unwrap_or_default(),
            route: SnappedRoute {
                geometry: square.clone(),
                snapped: square,
                directions: vec![DirectionStep(json!({
                    "distance": 612.4,
                    "duration": 440.9,
                    "type": 11,
                    "instruction": "Head east on Holstenstraße",
                    "name": "Holstenstraße",
                    "way_points": [0, 1]
                }))],
                mode: TravelMode::default(),
            },
        }
    }
}

/// Partial update of a stored route. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteChanges {
    pub name: Option<String>,
    pub mode: Option<TravelMode>,
    pub geometry: Option<Vec<Coordinate>>,
    pub snapped: Option<Vec<Coordinate>>,
    pub directions: Option<Vec<DirectionStep>>,
}

impl RouteChanges {
    pub fn patch(name: Option<String>, mode: Option<TravelMode>) -> Self {
        Self {
            name,
            mode,
            ..Default::default()
        }
    }

    /// Replaces the whole route, including its travel mode.
    pub fn replace(name: Option<String>, route: SnappedRoute) -> Self {
        Self {
            name,
            mode: Some(route.mode),
            geometry: Some(route.geometry),
            snapped: Some(route.snapped),
            directions: Some(route.directions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Body of a `PATCH` on a stored route.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct RoutePatch {
    pub name: Option<String>,
    pub mode: Option<String>,
}
