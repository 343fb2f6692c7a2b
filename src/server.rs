use std::error::Error;
use std::net::SocketAddr;

use tonic::transport::Server;
use tracing::info;

use routeguide_client::config::{DEFAULT_FEATURES_PATH, FEATURES_PATH_ENV};
use routeguide_client::{load_features, RouteGuideService};

const DEFAULT_ADDR: &str = "[::1]:10000";
const ADDR_ENV: &str = "ROUTE_GUIDE_ADDR";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let addr: SocketAddr = std::env::var(ADDR_ENV)
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    let path =
        std::env::var(FEATURES_PATH_ENV).unwrap_or_else(|_| DEFAULT_FEATURES_PATH.to_string());

    // The state used to generate responses, read-only from here on.
    let features = load_features(&path)?;
    info!(%addr, features = features.len(), "RouteGuide server listening");

    Server::builder()
        .add_service(RouteGuideService::new(features).into_server())
        .serve(addr)
        .await?;

    Ok(())
}
