//! Map links for snapped routes.
//!
//! The consumer map format accepts only a handful of waypoints, so longer
//! routes are approximated by a few points spread along the path.

use itertools::Itertools;
use model::coordinate::Coordinate;

pub const MAP_LINK_BASE: &str =
    "https://www.google.com/maps/dir/?api=1&travelmode=walking&waypoints=";

/// Paths up to this length are linked point by point.
pub const MAX_WAYPOINTS: usize = 5;

/// Picks the waypoints for a path: every point of short paths, otherwise the
/// first point, the points at a third and two thirds, and the last point.
/// Order is kept and coinciding points are not merged.
pub fn select_waypoints(path: &[Coordinate]) -> Vec<Coordinate> {
    let n = path.len();
    if n <= MAX_WAYPOINTS {
        return path.to_vec();
    }
    let mut waypoints = vec![path[0], path[n / 3]];
    if n > 4 {
        waypoints.push(path[2 * n / 3]);
    }
    waypoints.push(path[n - 1]);
    waypoints
}

/// Builds the external map link of a snapped path, `None` if there is nothing
/// to link. Waypoints are written `latitude,longitude`, the order the map
/// format expects.
pub fn to_map_link(snapped: &[Coordinate]) -> Option<String> {
    if snapped.len() < 2 {
        return None;
    }
    let waypoints = select_waypoints(snapped)
        .into_iter()
        .map(|c| format!("{},{}", c.latitude, c.longitude))
        .join("|");
    Some(format!("{MAP_LINK_BASE}{waypoints}"))
}
