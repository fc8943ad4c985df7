pub use crate::common::RouteResult;

use std::{env, sync::Arc};

use axum::{extract::FromRef, routing::on, Router};
use common::{route_not_found, METHOD_FILTER_ALL};
use route_shaping::{RouteShaper, RouteStore, RoutingProvider};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod common;
pub mod hateoas;
pub mod middleware;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

pub type Shaper = RouteShaper<Arc<dyn RoutingProvider>, Arc<dyn RouteStore>>;

#[derive(Clone, FromRef)]
pub struct WebState {
    pub shaper: Shaper,
}

impl WebState {
    pub fn new(provider: Arc<dyn RoutingProvider>, store: Arc<dyn RouteStore>) -> Self {
        Self {
            shaper: RouteShaper::new(provider, store),
        }
    }
}

pub struct WebConfig {
    pub bind_address: String,
}

impl WebConfig {
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_owned()),
        }
    }
}

/// The complete application, without a listener.
pub fn app(state: WebState) -> Router {
    Router::new()
        .nest_service("/api", api::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
        .layer(CorsLayer::very_permissive())
}

pub async fn start_web_server(state: WebState, config: WebConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(&config.bind_address).await?;
    log::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state).into_make_service()).await?;

    Ok(())
}
