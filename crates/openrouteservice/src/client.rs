use std::env;

use async_trait::async_trait;
use model::route::TravelMode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use route_shaping::{
    snapper::{DirectionsRequest, DirectionsResponse},
    RoutingProvider, SnapError,
};

use crate::ApiError;

pub const ORS_API_URL: &str = "https://api.openrouteservice.org/v2/directions";

#[derive(Clone, Debug)]
pub struct OrsCredentials {
    pub api_key: String,
    pub base_url: String,
}

impl OrsCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ORS_API_URL.to_owned(),
        }
    }

    /// Reads `ORS_API_KEY` and the optional `ORS_BASE_URL`.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("ORS_API_KEY").ok()?;
        let base_url = env::var("ORS_BASE_URL").unwrap_or_else(|_| ORS_API_URL.to_owned());
        Some(Self { api_key, base_url })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Directions client. Does neither retry nor time out on its own, wrap it in a
/// `BoundedProvider` for that.
#[derive(Clone, Debug)]
pub struct OrsClient {
    credentials: OrsCredentials,
    http: reqwest::Client,
}

impl OrsClient {
    pub fn new(credentials: OrsCredentials) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("route-shaping/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { credentials, http })
    }

    fn endpoint(&self, mode: &TravelMode) -> String {
        format!(
            "{}/{}/geojson",
            self.credentials.base_url.trim_end_matches('/'),
            mode
        )
    }

    /// Requests a route with turn instructions along `request.coordinates`.
    pub async fn directions(
        &self,
        mode: &TravelMode,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, ApiError> {
        let url = self.endpoint(mode);
        log::debug!(
            "Requesting '{url}' with {} coordinates.",
            request.coordinates.len()
        );

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, &self.credentials.api_key)
            .header(ACCEPT, "application/json, application/geo+json")
            .json(request)
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(response.json().await?),
            other => Err(ApiError::InvalidResponse {
                status_code: other,
                url,
                response: response.text().await.ok(),
            }),
        }
    }
}

#[async_trait]
impl RoutingProvider for OrsClient {
    async fn directions(
        &self,
        mode: &TravelMode,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, SnapError> {
        OrsClient::directions(self, mode, request)
            .await
            .map_err(SnapError::from)
    }
}
