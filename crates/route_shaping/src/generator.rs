//! Synthesizes closed shapes around a start point.
//!
//! Distances are turned into degrees with a flat-earth approximation
//! (`distance / 111 km`), on both axes. This keeps shapes simple but is only
//! reasonable for a few kilometers away from the poles: the longitude side of
//! a shape shrinks with `cos(latitude)` in reality and is not corrected here.

use model::{
    coordinate::Coordinate,
    shape::{ShapeKind, UnsupportedShapeError},
};
use utility::geo::meters_to_degrees;

/// Returns the closed ring of `shape`, starting and ending at `start`.
pub fn generate(shape: ShapeKind, start: Coordinate, distance_m: f64) -> Vec<Coordinate> {
    let d = meters_to_degrees(distance_m);
    match shape {
        ShapeKind::Square => vec![
            start,
            start.offset(d, 0.0),
            start.offset(d, d),
            start.offset(0.0, d),
            start,
        ],
        ShapeKind::Triangle => vec![
            start,
            start.offset(d, 0.0),
            start.offset(d / 2.0, d),
            start,
        ],
    }
}

/// Like [`generate`], for a shape given by name.
pub fn generate_named(
    shape: &str,
    start: Coordinate,
    distance_m: f64,
) -> Result<Vec<Coordinate>, UnsupportedShapeError> {
    Ok(generate(shape.parse()?, start, distance_m))
}
