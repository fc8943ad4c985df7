use std::{error, fmt, result};

use model::shape::UnsupportedShapeError;

pub mod generator;
pub mod memory;
pub mod shaper;
pub mod snapper;
pub mod store;
pub mod validate;
pub mod waypoints;

pub use shaper::{RouteShaper, ShapedRoute, StoredRoute};
pub use snapper::{RoutingProvider, SnapError};
pub use store::{RouteStore, StoreError};

#[derive(Debug)]
pub enum ShapingError {
    /// The request is malformed, `field` names the offending part.
    BadRequest { field: &'static str, message: String },
    /// The routing provider failed.
    Upstream(SnapError),
    /// The store failed before anything was snapped.
    Storage(StoreError),
    /// The route was snapped, but could not be stored.
    NotSaved {
        route: Box<ShapedRoute>,
        cause: StoreError,
    },
    NotFound,
}

impl ShapingError {
    pub fn bad_request(field: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            field,
            message: message.into(),
        }
    }
}

impl error::Error for ShapingError {}

impl fmt::Display for ShapingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BadRequest { field, message } => {
                write!(f, "invalid '{field}': {message}")
            }
            Self::Upstream(why) => write!(f, "{why}"),
            Self::Storage(why) => write!(f, "storage error: {why}"),
            Self::NotSaved { cause, .. } => {
                write!(f, "route snapped but not saved: {cause}")
            }
            Self::NotFound => write!(f, "route not found"),
        }
    }
}

impl From<SnapError> for ShapingError {
    fn from(value: SnapError) -> Self {
        Self::Upstream(value)
    }
}

impl From<StoreError> for ShapingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl From<UnsupportedShapeError> for ShapingError {
    fn from(value: UnsupportedShapeError) -> Self {
        Self::bad_request("shape", value.to_string())
    }
}

pub type ShapingResult<O> = result::Result<O, ShapingError>;
