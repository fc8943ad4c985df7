use std::{env, error, fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use model::{
    coordinate::Coordinate,
    route::{DirectionStep, TravelMode},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

/// Status reported when the provider could not be reached or answered garbage.
pub const BAD_GATEWAY: u16 = 502;
/// Status reported when the provider did not answer in time.
pub const GATEWAY_TIMEOUT: u16 = 504;

#[derive(Debug, Clone, PartialEq)]
pub enum SnapError {
    /// The provider answered with a non success status.
    Provider { status: u16, body: String },
    /// The provider could not be reached.
    Transport(String),
    /// The provider answered with success, but without a usable route.
    InvalidResponse(String),
    Timeout(Duration),
}

impl SnapError {
    /// The http status this error is surfaced with.
    pub fn status(&self) -> u16 {
        match self {
            Self::Provider { status, .. } => *status,
            Self::Transport(_) | Self::InvalidResponse(_) => BAD_GATEWAY,
            Self::Timeout(_) => GATEWAY_TIMEOUT,
        }
    }
}

impl error::Error for SnapError {}

impl fmt::Display for SnapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Provider { status, body } => write!(f, "ORS error {status}: {body}"),
            Self::Transport(why) => write!(f, "routing provider unreachable: {why}"),
            Self::InvalidResponse(why) => {
                write!(f, "invalid routing provider response: {why}")
            }
            Self::Timeout(after) => write!(
                f,
                "routing provider did not answer within {}s",
                after.as_secs_f64()
            ),
        }
    }
}

/// Body of a directions request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsRequest {
    pub coordinates: Vec<Coordinate>,
    pub instructions: bool,
}

impl DirectionsRequest {
    pub fn with_instructions(coordinates: &[Coordinate]) -> Self {
        Self {
            coordinates: coordinates.to_vec(),
            instructions: true,
        }
    }
}

/// The geojson feature collection a directions request is answered with.
/// Only the parts needed for snapping are modelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub features: Vec<RouteFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFeature {
    pub geometry: RouteGeometry,
    #[serde(default)]
    pub properties: Option<RouteProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    pub coordinates: Vec<Coordinate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteProperties {
    #[serde(default)]
    pub segments: Option<Vec<RouteSegment>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    #[serde(default)]
    pub steps: Option<Vec<DirectionStep>>,
}

/// An external service that aligns paths to the road network.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn directions(
        &self,
        mode: &TravelMode,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, SnapError>;
}

#[async_trait]
impl<T> RoutingProvider for Arc<T>
where
    T: RoutingProvider + ?Sized,
{
    async fn directions(
        &self,
        mode: &TravelMode,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, SnapError> {
        (**self).directions(mode, request).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapped {
    pub snapped: Vec<Coordinate>,
    pub directions: Vec<DirectionStep>,
}

/// Snaps `coordinates` to the road network. The caller makes sure there are at
/// least two points.
pub async fn snap<P>(
    provider: &P,
    coordinates: &[Coordinate],
    mode: &TravelMode,
) -> Result<Snapped, SnapError>
where
    P: RoutingProvider + ?Sized,
{
    let response = provider
        .directions(mode, &DirectionsRequest::with_instructions(coordinates))
        .await?;
    extract(response)
}

/// Takes the geometry of the first route and the steps of its first segment.
/// Missing segments or steps mean there are no directions.
pub fn extract(response: DirectionsResponse) -> Result<Snapped, SnapError> {
    let feature = response
        .features
        .into_iter()
        .next()
        .ok_or_else(|| SnapError::InvalidResponse("no route returned".to_owned()))?;

    let directions = feature
        .properties
        .and_then(|properties| properties.segments)
        .and_then(|segments| segments.into_iter().next())
        .and_then(|segment| segment.steps)
        .unwrap_or_default();

    Ok(Snapped {
        snapped: feature.geometry.coordinates,
        directions,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapLimits {
    pub max_concurrent: usize,
    pub timeout: Duration,
}

impl Default for SnapLimits {
    fn default() -> Self {
        Self {
            max_concurrent: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl SnapLimits {
    /// Reads `SNAP_MAX_CONCURRENT` and `SNAP_TIMEOUT_SECS`, falling back to the
    /// defaults for absent or unparsable values.
    pub fn from_env() -> Self {
        let default = Self::default();
        let max_concurrent = env::var("SNAP_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &usize| *v > 0)
            .unwrap_or(default.max_concurrent);
        let timeout = env::var("SNAP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(default.timeout);
        Self {
            max_concurrent,
            timeout,
        }
    }
}

/// Bounds the number of outstanding provider calls and puts a deadline on
/// each, waiting for a free slot included.
pub struct BoundedProvider<P> {
    inner: P,
    permits: Semaphore,
    timeout: Duration,
}

impl<P: RoutingProvider> BoundedProvider<P> {
    pub fn new(inner: P, limits: SnapLimits) -> Self {
        Self {
            inner,
            permits: Semaphore::new(limits.max_concurrent),
            timeout: limits.timeout,
        }
    }
}

#[async_trait]
impl<P: RoutingProvider> RoutingProvider for BoundedProvider<P> {
    async fn directions(
        &self,
        mode: &TravelMode,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, SnapError> {
        let call = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|why| SnapError::Transport(why.to_string()))?;
            self.inner.directions(mode, request).await
        };
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "routing provider timed out after {:?} ({} points, {})",
                    self.timeout,
                    request.coordinates.len(),
                    mode
                );
                Err(SnapError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    struct Echo;

    #[async_trait]
    impl RoutingProvider for Echo {
        async fn directions(
            &self,
            _mode: &TravelMode,
            request: &DirectionsRequest,
        ) -> Result<DirectionsResponse, SnapError> {
            Ok(DirectionsResponse {
                features: vec![RouteFeature {
                    geometry: RouteGeometry {
                        coordinates: request.coordinates.clone(),
                    },
                    properties: None,
                }],
            })
        }
    }

    struct Slow {
        running: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    impl Slow {
        fn new(delay: Duration) -> Self {
            Self {
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl RoutingProvider for Slow {
        async fn directions(
            &self,
            mode: &TravelMode,
            request: &DirectionsRequest,
        ) -> Result<DirectionsResponse, SnapError> {
            let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Echo.directions(mode, request).await
        }
    }

    fn line() -> Vec<Coordinate> {
        vec![Coordinate::new(10.0, 50.0), Coordinate::new(10.01, 50.01)]
    }

    #[test]
    fn extracts_first_route_and_first_segment_steps() {
        let response: DirectionsResponse = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[10.0, 50.0], [10.005, 50.002], [10.01, 50.01]]
                    },
                    "properties": {
                        "segments": [
                            { "steps": [{ "instruction": "Head north" }, { "instruction": "Arrive" }] },
                            { "steps": [{ "instruction": "ignored" }] }
                        ]
                    }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] }
                }
            ]
        }))
        .unwrap();

        let snapped = extract(response).unwrap();
        assert_eq!(snapped.snapped.len(), 3);
        assert_eq!(snapped.snapped[1], Coordinate::new(10.005, 50.002));
        assert_eq!(
            snapped.directions,
            vec![
                DirectionStep(json!({ "instruction": "Head north" })),
                DirectionStep(json!({ "instruction": "Arrive" })),
            ]
        );
    }

    #[test]
    fn missing_segments_mean_no_directions() {
        for properties in [json!(null), json!({}), json!({ "segments": [] }), json!({ "segments": [{}] })] {
            let response: DirectionsResponse = serde_json::from_value(json!({
                "features": [{
                    "geometry": { "coordinates": [[10.0, 50.0], [10.01, 50.01]] },
                    "properties": properties
                }]
            }))
            .unwrap();
            assert_eq!(extract(response).unwrap().directions, vec![]);
        }
    }

    #[test]
    fn no_features_is_an_invalid_response() {
        let why = extract(DirectionsResponse::default()).unwrap_err();
        assert!(matches!(why, SnapError::InvalidResponse(_)));
        assert_eq!(why.status(), BAD_GATEWAY);
    }

    #[test]
    fn request_body_has_coordinate_pairs_and_instructions() {
        let body = serde_json::to_value(DirectionsRequest::with_instructions(&line())).unwrap();
        assert_eq!(
            body,
            json!({ "coordinates": [[10.0, 50.0], [10.01, 50.01]], "instructions": true })
        );
    }

    #[test]
    fn provider_errors_keep_status_and_body() {
        let why = SnapError::Provider {
            status: 503,
            body: "maintenance".to_owned(),
        };
        assert_eq!(why.status(), 503);
        assert_eq!(why.to_string(), "ORS error 503: maintenance");
    }

    #[tokio::test]
    async fn snap_with_echo_returns_input() {
        let snapped = snap(&Echo, &line(), &TravelMode::default()).await.unwrap();
        assert_eq!(snapped.snapped, line());
        assert!(snapped.directions.is_empty());
    }

    #[tokio::test]
    async fn bounded_provider_limits_concurrency() {
        let slow = Arc::new(Slow::new(Duration::from_millis(20)));
        let bounded = Arc::new(BoundedProvider::new(
            slow.clone(),
            SnapLimits {
                max_concurrent: 2,
                timeout: Duration::from_secs(5),
            },
        ));

        let mut handles = vec![];
        for _ in 0..6 {
            let bounded = bounded.clone();
            handles.push(tokio::spawn(async move {
                snap(&*bounded, &line(), &TravelMode::default()).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(slow.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn bounded_provider_applies_deadline() {
        let bounded = BoundedProvider::new(
            Slow::new(Duration::from_secs(10)),
            SnapLimits {
                max_concurrent: 1,
                timeout: Duration::from_millis(10),
            },
        );
        let why = snap(&bounded, &line(), &TravelMode::default())
            .await
            .unwrap_err();
        assert_eq!(why, SnapError::Timeout(Duration::from_millis(10)));
        assert_eq!(why.status(), GATEWAY_TIMEOUT);
    }
}
