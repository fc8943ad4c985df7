use axum::{
    extract::{OriginalUri, Path, State},
    http::{Method, Uri},
    routing::{get, on, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use model::{
    route::{RoutePatch, RouteRecord},
    shape::{ShapeInput, ShapeKind},
};
use route_shaping::{ShapedRoute, ShapingError, StoredRoute};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{json, Value};
use utility::id::Id;

use crate::{
    common::{
        route_not_found, schema, HateoasResult, RouteErrorResponse, RouteResult,
        METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::{base_url::BaseUrl, user::CurrentUser},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/map{}", format_args!($($arg)*))
    };
}

type JsonBody<T> = WithRejection<Json<T>, RouteErrorResponse>;
type RouteId = WithRejection<Path<i64>, RouteErrorResponse>;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/snap", post(snap))
        .route("/snap-and-save", post(snap_and_save))
        .route("/shape", post(snap_and_save))
        .route("/shape-from-location", post(shape_from_location))
        .route("/shapes", get(get_shapes))
        .route("/shapes/schema", get(schema::<StoredRoute>))
        .route(
            "/shapes/:id",
            get(get_shape)
                .patch(patch_shape)
                .put(put_shape)
                .delete(delete_shape),
        )
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Serialize, JsonSchema)]
struct ShapesDto {
    shapes: Vec<hateoas::Response<StoredRoute>>,
}

fn failed(method: Method, uri: &Uri) -> impl FnOnce(ShapingError) -> RouteErrorResponse + '_ {
    move |why| {
        RouteErrorResponse::from(why)
            .with_method(&method)
            .with_uri(uri.path())
    }
}

async fn snap(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { shaper }): State<WebState>,
    base_url: BaseUrl,
    WithRejection(Json(input), _): JsonBody<ShapeInput>,
) -> HateoasResult<ShapedRoute> {
    shaper
        .snap(&input)
        .await
        .map(|route| shaped_hateoas(route, &base_url).json())
        .map_err(failed(Method::POST, &original_uri))
}

async fn snap_and_save(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { shaper }): State<WebState>,
    base_url: BaseUrl,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(input), _): JsonBody<ShapeInput>,
) -> HateoasResult<ShapedRoute> {
    shaper
        .snap_and_save(&user, &input)
        .await
        .map(|route| shaped_hateoas(route, &base_url).json())
        .map_err(failed(Method::POST, &original_uri))
}

/// Generates a shape around the caller's location, a 1 km square unless told
/// otherwise.
async fn shape_from_location(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { shaper }): State<WebState>,
    base_url: BaseUrl,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(input), _): JsonBody<ShapeInput>,
) -> HateoasResult<ShapedRoute> {
    if input.start.is_none() {
        return Err(failed(Method::POST, &original_uri)(ShapingError::bad_request(
            "start",
            "Missing 'start', the current location as [longitude, latitude].",
        )));
    }
    let input = ShapeInput {
        shape: input
            .shape
            .or_else(|| Some(ShapeKind::Square.name().to_owned())),
        ..input
    };

    shaper
        .snap_and_save(&user, &input)
        .await
        .map(|route| shaped_hateoas(route, &base_url).json())
        .map_err(failed(Method::POST, &original_uri))
}

async fn get_shapes(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { shaper }): State<WebState>,
    base_url: BaseUrl,
    CurrentUser(user): CurrentUser,
) -> HateoasResult<ShapesDto> {
    let routes = shaper
        .routes(&user)
        .await
        .map_err(failed(Method::GET, &original_uri))?;
    let dto = ShapesDto {
        shapes: routes
            .into_iter()
            .map(|route| stored_hateoas(route, &base_url))
            .collect(),
    };
    Ok(hateoas::Response::builder(dto, &base_url)
        .link("self", resource!("/shapes"))
        .build()
        .json())
}

async fn get_shape(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { shaper }): State<WebState>,
    base_url: BaseUrl,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): RouteId,
) -> HateoasResult<StoredRoute> {
    shaper
        .route(&user, &Id::new(id))
        .await
        .map(|route| stored_hateoas(route, &base_url).json())
        .map_err(failed(Method::GET, &original_uri))
}

async fn patch_shape(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { shaper }): State<WebState>,
    base_url: BaseUrl,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): RouteId,
    WithRejection(Json(patch), _): JsonBody<RoutePatch>,
) -> HateoasResult<StoredRoute> {
    shaper
        .patch(&user, &Id::new(id), &patch)
        .await
        .map(|route| stored_hateoas(route, &base_url).json())
        .map_err(failed(Method::PATCH, &original_uri))
}

async fn put_shape(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { shaper }): State<WebState>,
    base_url: BaseUrl,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): RouteId,
    WithRejection(Json(input), _): JsonBody<ShapeInput>,
) -> HateoasResult<StoredRoute> {
    shaper
        .replace(&user, &Id::new(id), &input)
        .await
        .map(|route| stored_hateoas(route, &base_url).json())
        .map_err(failed(Method::PUT, &original_uri))
}

async fn delete_shape(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { shaper }): State<WebState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Path(id), _): RouteId,
) -> RouteResult<Json<Value>> {
    let id: Id<RouteRecord> = Id::new(id);
    shaper
        .delete(&user, &id)
        .await
        .map_err(failed(Method::DELETE, &original_uri))?;
    Ok(Json(json!({
        "message": "Route deleted.",
        "id": id,
    })))
}

pub(crate) fn shaped_hateoas(
    route: ShapedRoute,
    base_url: &BaseUrl,
) -> hateoas::Response<ShapedRoute> {
    let own = route
        .shape_id
        .as_ref()
        .map(|id| resource!("/shapes/{}", id));
    let export = route.export_url.clone();
    let points = route.snapped.len();
    hateoas::Response::builder(route, base_url)
        .link_option("self", own)
        .link_extern_option("export", export)
        .debug_info("snappedPoints", points)
        .build()
}

pub(crate) fn stored_hateoas(
    route: StoredRoute,
    base_url: &BaseUrl,
) -> hateoas::Response<StoredRoute> {
    let own = resource!("/shapes/{}", route.id);
    let export = route.export_url.clone();
    let points = route.record.route.snapped.len();
    hateoas::Response::builder(route, base_url)
        .link("self", own)
        .link_extern_option("export", export)
        .debug_info("snappedPoints", points)
        .build()
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use async_trait::async_trait;
    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use model::{
        route::{RouteChanges, TravelMode},
        user::User,
        WithId,
    };
    use route_shaping::{
        memory::MemoryStore,
        snapper::{DirectionsRequest, DirectionsResponse, RouteFeature, RouteGeometry},
        store, RouteStore, RoutingProvider, SnapError, StoreError,
    };
    use tower::ServiceExt;

    use crate::{app, middleware::user::USER_ID_HEADER};

    use super::*;

    #[derive(Default)]
    struct EchoSpy {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RoutingProvider for EchoSpy {
        async fn directions(
            &self,
            _mode: &TravelMode,
            request: &DirectionsRequest,
        ) -> Result<DirectionsResponse, SnapError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
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

    struct Unavailable;

    #[async_trait]
    impl RoutingProvider for Unavailable {
        async fn directions(
            &self,
            _mode: &TravelMode,
            _request: &DirectionsRequest,
        ) -> Result<DirectionsResponse, SnapError> {
            Err(SnapError::Provider {
                status: 503,
                body: "upstream down for maintenance".to_owned(),
            })
        }
    }

    struct BrokenStore;

    fn offline() -> StoreError {
        StoreError::other(io::Error::new(io::ErrorKind::Other, "database offline"))
    }

    #[async_trait]
    impl RouteStore for BrokenStore {
        async fn insert(&self, _record: RouteRecord) -> store::Result<Id<RouteRecord>> {
            Err(offline())
        }

        async fn find_by_user(
            &self,
            _user: &Id<User>,
        ) -> store::Result<Vec<WithId<RouteRecord>>> {
            Err(offline())
        }

        async fn find(
            &self,
            _user: &Id<User>,
            _id: &Id<RouteRecord>,
        ) -> store::Result<WithId<RouteRecord>> {
            Err(offline())
        }

        async fn update(
            &self,
            _user: &Id<User>,
            _id: &Id<RouteRecord>,
            _changes: RouteChanges,
        ) -> store::Result<WithId<RouteRecord>> {
            Err(offline())
        }

        async fn delete(&self, _user: &Id<User>, _id: &Id<RouteRecord>) -> store::Result<()> {
            Err(offline())
        }
    }

    fn state_with(provider: Arc<dyn RoutingProvider>, store: Arc<dyn RouteStore>) -> WebState {
        WebState::new(provider, store)
    }

    fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "localhost:8080");
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(state: &WebState, request: Request<Body>) -> (StatusCode, Value) {
        let response = app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn square_at_kiel() -> Value {
        json!({ "start": [10.13, 54.32], "shape": "square", "distance": 500 })
    }

    #[tokio::test]
    async fn both_geometry_and_shape_is_rejected_before_snapping() {
        let spy = Arc::new(EchoSpy::default());
        let state = state_with(spy.clone(), Arc::new(MemoryStore::new()));

        let body = json!({
            "geometry": [[10.0, 50.0], [10.01, 50.01]],
            "start": [10.0, 50.0],
            "shape": "square"
        });
        let (status, json) = call(&state, request("POST", "/api/v1/map/snap", None, Some(body))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["field"], "geometry");
        assert_eq!(json["requestedUri"], "/api/v1/map/snap");
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn snap_returns_route_with_export_link() {
        let state = state_with(Arc::new(EchoSpy::default()), Arc::new(MemoryStore::new()));

        let (status, json) = call(
            &state,
            request("POST", "/api/v1/map/snap", None, Some(square_at_kiel())),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["snapped"].as_array().map(Vec::len), Some(5));
        assert_eq!(json["snapped"], json["original_shape"]);
        assert_eq!(json["directions"], json!([]));
        assert_eq!(json["mode"], "foot-walking");
        assert!(json.get("shape_id").is_none());

        let export = json["export_url"].as_str().unwrap();
        assert!(export.starts_with("https://www.google.com/maps/dir/?api=1"));
        assert_eq!(json["links"][0]["rel"], "export");
        assert_eq!(json["links"][0]["href"], export);
    }

    #[tokio::test]
    async fn saving_requires_an_identity() {
        let spy = Arc::new(EchoSpy::default());
        let state = state_with(spy.clone(), Arc::new(MemoryStore::new()));

        let (status, json) = call(
            &state,
            request("POST", "/api/v1/map/shape", None, Some(square_at_kiel())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["httpMethod"], "POST");

        let (status, _) = call(&state, request("GET", "/api/v1/map/shapes", Some("  "), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn routes_are_saved_listed_patched_and_deleted() {
        let state = state_with(Arc::new(EchoSpy::default()), Arc::new(MemoryStore::new()));

        let mut body = square_at_kiel();
        body["name"] = json!("Harbour loop");
        let (status, saved) = call(
            &state,
            request("POST", "/api/v1/map/snap-and-save", Some("alice"), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = saved["shape_id"].as_i64().unwrap();
        let own = format!("http://localhost:8080/api/v1/map/shapes/{id}");
        assert_eq!(saved["links"][0]["rel"], "self");
        assert_eq!(saved["links"][0]["href"], own);

        let (status, list) = call(&state, request("GET", "/api/v1/map/shapes", Some("alice"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["shapes"].as_array().map(Vec::len), Some(1));
        assert_eq!(list["shapes"][0]["name"], "Harbour loop");
        assert!(list["shapes"][0]["export_url"].is_string());

        let (status, list) = call(&state, request("GET", "/api/v1/map/shapes", Some("bob"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["shapes"], json!([]));

        let uri = format!("/api/v1/map/shapes/{id}");
        let (status, _) = call(&state, request("GET", &uri, Some("bob"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, patched) = call(
            &state,
            request("PATCH", &uri, Some("alice"), Some(json!({ "name": "Sunday" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["name"], "Sunday");
        assert_eq!(patched["snapped_route"], saved["snapped"]);

        let (status, _) = call(&state, request("PATCH", &uri, Some("alice"), Some(json!({})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&state, request("DELETE", &uri, Some("bob"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&state, request("DELETE", &uri, Some("alice"), None)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&state, request("GET", &uri, Some("alice"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn replacing_resnaps_the_new_shape() {
        let spy = Arc::new(EchoSpy::default());
        let state = state_with(spy.clone(), Arc::new(MemoryStore::new()));

        let (_, saved) = call(
            &state,
            request("POST", "/api/v1/map/shape", Some("alice"), Some(square_at_kiel())),
        )
        .await;
        let uri = format!("/api/v1/map/shapes/{}", saved["shape_id"]);

        let triangle = json!({ "start": [10.13, 54.32], "shape": "triangle" });
        let (status, replaced) = call(&state, request("PUT", &uri, Some("alice"), Some(triangle))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(replaced["snapped_route"].as_array().map(Vec::len), Some(4));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn shape_from_location_defaults_to_a_square() {
        let state = state_with(Arc::new(EchoSpy::default()), Arc::new(MemoryStore::new()));

        let (status, json) = call(
            &state,
            request(
                "POST",
                "/api/v1/map/shape-from-location",
                Some("alice"),
                Some(json!({ "start": [10.13, 54.32] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["original_shape"].as_array().map(Vec::len), Some(5));
        assert!(json["shape_id"].is_i64());

        let (status, json) = call(
            &state,
            request(
                "POST",
                "/api/v1/map/shape-from-location",
                Some("alice"),
                Some(json!({ "shape": "triangle" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["field"], "start");
    }

    #[tokio::test]
    async fn pre_snapped_routes_skip_the_provider() {
        let spy = Arc::new(EchoSpy::default());
        let state = state_with(spy.clone(), Arc::new(MemoryStore::new()));

        let body = json!({
            "geometry": [[10.0, 50.0], [10.01, 50.01]],
            "snapped_route": [[10.0, 50.0], [10.005, 50.004], [10.01, 50.01]]
        });
        let (status, json) = call(&state, request("POST", "/api/v1/map/shape", Some("alice"), Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["snapped"].as_array().map(Vec::len), Some(3));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_failure_keeps_its_status() {
        let state = state_with(Arc::new(Unavailable), Arc::new(MemoryStore::new()));

        let (status, json) = call(
            &state,
            request("POST", "/api/v1/map/snap", None, Some(square_at_kiel())),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["upstreamStatus"], 503);
        assert!(json["detailedInformation"]
            .as_str()
            .unwrap()
            .contains("upstream down for maintenance"));
    }

    #[tokio::test]
    async fn failed_save_returns_the_snapped_route() {
        let state = state_with(Arc::new(EchoSpy::default()), Arc::new(BrokenStore));

        let (status, json) = call(
            &state,
            request("POST", "/api/v1/map/shape", Some("alice"), Some(square_at_kiel())),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["detailedInformation"], "database offline");
        assert_eq!(json["partialResult"]["snapped"].as_array().map(Vec::len), Some(5));
        assert!(json["partialResult"].get("shape_id").is_none());
    }

    #[tokio::test]
    async fn malformed_requests_are_structured_errors() {
        let state = state_with(Arc::new(EchoSpy::default()), Arc::new(MemoryStore::new()));

        let request_with_text = Request::builder()
            .method("POST")
            .uri("/api/v1/map/snap")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let (status, json) = call(&state, request_with_text).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Malformed request body.");

        let (status, json) = call(&state, request("GET", "/api/v1/map/shapes/abc", Some("alice"), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["field"], "id");

        let (status, json) = call(&state, request("GET", "/api/v1/map/nowhere", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["requestedUri"], "/api/v1/map/nowhere");
    }

    #[tokio::test]
    async fn schema_and_ping_are_served() {
        let state = state_with(Arc::new(EchoSpy::default()), Arc::new(MemoryStore::new()));

        let (status, json) = call(&state, request("GET", "/api/v1/map/shapes/schema", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["properties"]["export_url"].is_object());

        let (status, json) = call(&state, request("GET", "/api/ping", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "pong!");
    }
}
