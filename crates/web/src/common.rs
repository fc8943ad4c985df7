use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        OriginalUri, Query, Request,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::MethodFilter,
    Json,
};
use model::ExampleData;
use route_shaping::{ShapedRoute, ShapingError};
use schemars::{schema_for, schema_for_value, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::hateoas;

pub type RouteResult<O> = Result<O, RouteErrorResponse>;
pub type HateoasResult<O> = RouteResult<Json<hateoas::Response<O>>>;

/// A `MethodFilter` that matches all http methods.
pub(crate) const METHOD_FILTER_ALL: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE);

// - Services returning commonly used responses -

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaParams {
    #[serde(default = "Default::default")]
    example_data: bool,
}

pub(crate) async fn schema<T: ExampleData + JsonSchema + Serialize>(
    Query(params): Query<SchemaParams>,
) -> impl IntoResponse {
    if params.example_data {
        Json(schema_for_value!(T::example_data()))
    } else {
        Json(schema_for!(T))
    }
}

pub(crate) async fn route_not_found(
    OriginalUri(original_uri): OriginalUri,
    req: Request,
) -> impl IntoResponse {
    RouteErrorResponse::not_found(req.method(), original_uri.path())
}

// - Commonly used responeses -

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,

    pub http_method: Option<String>,

    pub requested_uri: Option<String>,

    pub message: Option<String>,

    pub detailed_information: Option<String>,

    /// The request field that was rejected.
    pub field: Option<String>,

    /// The status the routing provider answered with.
    pub upstream_status: Option<u16>,

    /// A route that was snapped but could not be stored.
    pub partial_result: Option<ShapedRoute>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            http_method: None,
            requested_uri: None,
            message: None,
            detailed_information: None,
            field: None,
            upstream_status: None,
            partial_result: None,
        }
    }

    pub fn not_found(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .with_method(method)
            .with_uri(uri)
            .with_default_message()
    }

    pub fn unauthorized(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
            .with_method(method)
            .with_uri(uri)
            .with_message("Missing caller identity.")
    }

    pub fn with_method(mut self, method: &Method) -> Self {
        self.http_method = Some(method.to_string());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.requested_uri = Some(uri.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_default_message(self) -> Self {
        let message = self
            .status_code
            .canonical_reason()
            .unwrap_or("Unknown error.");
        self.with_message(message)
    }

    pub fn with_detailed_information(mut self, message: impl Into<String>) -> Self {
        self.detailed_information = Some(message.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl From<ShapingError> for RouteErrorResponse {
    fn from(value: ShapingError) -> Self {
        match value {
            ShapingError::BadRequest { field, message } => {
                Self::new(StatusCode::BAD_REQUEST)
                    .with_message(message)
                    .with_field(field)
            }
            ShapingError::Upstream(why) => {
                let status = why.status();
                let mut response = Self::new(
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                )
                .with_message("The routing provider could not snap the route.")
                .with_detailed_information(why.to_string());
                response.upstream_status = Some(status);
                response
            }
            ShapingError::Storage(why) => Self::new(StatusCode::INTERNAL_SERVER_ERROR)
                .with_message("Route storage failed.")
                .with_detailed_information(why.to_string()),
            ShapingError::NotSaved { route, cause } => {
                let mut response = Self::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_message("The route was snapped but could not be saved.")
                    .with_detailed_information(cause.to_string());
                response.partial_result = Some(*route);
                response
            }
            ShapingError::NotFound => Self::new(StatusCode::NOT_FOUND)
                .with_message("The requested route does not exist."),
        }
    }
}

impl From<JsonRejection> for RouteErrorResponse {
    fn from(value: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST)
            .with_message("Malformed request body.")
            .with_detailed_information(value.body_text())
    }
}

impl From<PathRejection> for RouteErrorResponse {
    fn from(value: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST)
            .with_message("Malformed route id.")
            .with_detailed_information(value.body_text())
            .with_field("id")
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(self)).into_response()
    }
}
