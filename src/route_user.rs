use std::error::Error;

use futures::StreamExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use routeguide_client::{
    load_features, ClientConfig, ExchangeOutcome, GrpcTransport, GuideClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env();
    let features = load_features(&config.features_path)?;
    let transport = GrpcTransport::connect(config.target.clone()).await?;
    let client = GuideClient::new(transport, features, config);

    // Failed calls are logged by the client; carry on with the next one.

    // Looking for a valid feature.
    let _ = client.get_feature(409_146_138, -746_188_906).await;

    // Feature missing.
    let _ = client.get_feature(0, 0).await;

    // Looking for features between 40, -75 and 42, -73.
    match client
        .list_features(400_000_000, -750_000_000, 420_000_000, -730_000_000)
        .await
    {
        Ok(mut features) => {
            let mut i = 0;
            while let Some(feature) = features.next().await {
                match feature {
                    Ok(feature) => {
                        i += 1;
                        info!(
                            "Result #{}: \"{}\" at {}",
                            i,
                            feature.name,
                            feature.location.unwrap_or_default()
                        );
                    }
                    Err(status) => {
                        warn!("ListFeatures failed: {}", status.message());
                        break;
                    }
                }
            }
        }
        Err(err) => warn!("{}", err),
    }

    // Record a few randomly selected points from the features file.
    let mut rng = StdRng::from_entropy();
    if let ExchangeOutcome::Failed(status) = client.record_route(&mut rng).await? {
        warn!(code = ?status.code(), "No route summary");
    }

    // Send and receive some notes.
    let mut chat = client.route_chat().await?;
    let timeout = client.config().route_chat_timeout;
    if !chat.await_until(timeout).await {
        warn!("RouteChat can not finish within {:?}", timeout);
        chat.cancel();
    }

    Ok(())
}
