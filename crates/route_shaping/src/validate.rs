//! Turns wire input into validated requests. Everything past this module
//! works with typed, checked values only.

use model::{
    coordinate::{parse_path, Coordinate},
    route::TravelMode,
    shape::{ShapeInput, ShapeKind, ShapeRequest, DEFAULT_DISTANCE_M},
};

use crate::{ShapingError, ShapingResult};

const EITHER_OR: &str =
    "Provide either 'geometry' (list of coordinates) or both 'start' and 'shape'";

/// Decides the input mode: a drawn `geometry`, or a `start` and `shape` to
/// generate one from. Exactly one of them has to be given.
pub fn shape_request(input: &ShapeInput) -> ShapingResult<ShapeRequest> {
    let mode = travel_mode(input.mode.as_deref())?;
    let generative = input.start.is_some() || input.shape.is_some();

    match (&input.geometry, generative) {
        (Some(_), true) => Err(ShapingError::bad_request(
            "geometry",
            format!("{EITHER_OR}, not both."),
        )),
        (None, false) => Err(ShapingError::bad_request("geometry", EITHER_OR)),
        (Some(geometry), false) => {
            let path = parse_path(geometry)
                .map_err(|why| ShapingError::bad_request("geometry", why.to_string()))?;
            Ok(ShapeRequest::geometry(path, mode))
        }
        (None, true) => {
            let start = input
                .start
                .as_deref()
                .ok_or_else(|| ShapingError::bad_request("start", "Missing 'start'."))?;
            let start = Coordinate::try_from_slice(start)
                .map_err(|why| ShapingError::bad_request("start", why.to_string()))?;
            let shape: ShapeKind = input
                .shape
                .as_deref()
                .ok_or_else(|| ShapingError::bad_request("shape", "Missing 'shape'."))?
                .parse()?;
            let distance_m = distance(input.distance)?;
            Ok(ShapeRequest::generated(start, shape, distance_m, mode))
        }
    }
}

/// The client supplied snapped path, only accepted together with `geometry`.
pub fn presnapped(input: &ShapeInput) -> ShapingResult<Option<Vec<Coordinate>>> {
    let Some(snapped) = &input.snapped_route else {
        return Ok(None);
    };
    if input.geometry.is_none() {
        return Err(ShapingError::bad_request(
            "snapped_route",
            "'snapped_route' is only accepted together with 'geometry'.",
        ));
    }
    parse_path(snapped)
        .map(Some)
        .map_err(|why| ShapingError::bad_request("snapped_route", why.to_string()))
}

/// Routing profiles are forwarded as a path segment, so they are restricted
/// to the characters profiles consist of.
pub fn travel_mode(mode: Option<&str>) -> ShapingResult<TravelMode> {
    match mode {
        None => Ok(TravelMode::default()),
        Some(mode)
            if !mode.is_empty()
                && mode
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
        {
            Ok(TravelMode::new(mode))
        }
        Some(mode) => Err(ShapingError::bad_request(
            "mode",
            format!("'{mode}' is not a travel mode."),
        )),
    }
}

pub fn name(name: Option<&str>) -> ShapingResult<Option<String>> {
    match name.map(str::trim) {
        None => Ok(None),
        Some("") => Err(ShapingError::bad_request("name", "'name' must not be empty.")),
        Some(name) => Ok(Some(name.to_owned())),
    }
}

fn distance(distance: Option<f64>) -> ShapingResult<f64> {
    match distance {
        None => Ok(DEFAULT_DISTANCE_M),
        Some(d) if d.is_finite() && d > 0.0 => Ok(d),
        Some(d) => Err(ShapingError::bad_request(
            "distance",
            format!("'distance' must be a positive number of meters, got {d}."),
        )),
    }
}
