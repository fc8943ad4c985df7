use std::{process::ExitCode, sync::Arc};

use database::{DatabaseConnectionInfo, PgDatabase};
use openrouteservice::client::{OrsClient, OrsCredentials};
use route_shaping::{
    memory::MemoryStore,
    snapper::{BoundedProvider, SnapLimits},
    RouteStore, RoutingProvider,
};
use web::{start_web_server, WebConfig, WebState};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    // routing provider
    let Some(credentials) = OrsCredentials::from_env() else {
        log::error!("expected ORS_API_KEY in env.");
        return ExitCode::FAILURE;
    };
    let client = match OrsClient::new(credentials) {
        Ok(client) => client,
        Err(why) => {
            log::error!("could not create routing client: {why}");
            return ExitCode::FAILURE;
        }
    };
    let limits = SnapLimits::from_env();
    log::info!(
        "snapping with at most {} concurrent requests, {:?} deadline",
        limits.max_concurrent,
        limits.timeout
    );
    let provider: Arc<dyn RoutingProvider> = Arc::new(BoundedProvider::new(client, limits));

    // storage
    let store: Arc<dyn RouteStore> = match DatabaseConnectionInfo::from_env() {
        Some(info) => match PgDatabase::connect(info).await {
            Ok(database) => Arc::new(database),
            Err(why) => {
                log::error!("could not connect to database: {why}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            log::warn!("no database configured, routes are kept in memory only.");
            Arc::new(MemoryStore::new())
        }
    };

    // web server
    match start_web_server(WebState::new(provider, store), WebConfig::from_env()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(why) => {
            log::error!("web server failed: {why}");
            ExitCode::FAILURE
        }
    }
}
