//! Snapping via the openrouteservice directions api.

use std::error;
use std::fmt;
use std::sync::Arc;

use route_shaping::SnapError;

pub mod client;

pub use client::{OrsClient, OrsCredentials};

#[derive(Debug, Clone)]
pub enum ApiError {
    RequestError(Arc<reqwest::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        response: Option<String>,
    },
}

impl error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::RequestError(e) => write!(f, "openrouteservice request failed: {e}"),
            ApiError::InvalidResponse {
                status_code,
                url,
                response: Some(text),
            } => write!(f, "openrouteservice answered {status_code} for {url}: {text}"),
            ApiError::InvalidResponse {
                status_code, url, ..
            } => write!(f, "openrouteservice answered {status_code} for {url}"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::RequestError(Arc::new(e))
    }
}

impl From<ApiError> for SnapError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::InvalidResponse {
                status_code,
                response,
                ..
            } => SnapError::Provider {
                status: status_code.as_u16(),
                body: response.unwrap_or_default(),
            },
            ApiError::RequestError(e) if e.is_decode() => {
                SnapError::InvalidResponse(e.to_string())
            }
            ApiError::RequestError(e) => SnapError::Transport(e.to_string()),
        }
    }
}
