//! Client for the RouteGuide service, covering the four gRPC call shapes:
//! unary (`GetFeature`), server streaming (`ListFeatures`), client streaming
//! (`RecordRoute`) and bidirectional streaming (`RouteChat`).
//!
//! The streaming calls are driven through an [`OutboundStream`] handle while a
//! [`ResponseSink`] consumes the inbound side on its own task. The two sides
//! meet again at a [`CompletionSignal`], which fires once the sink has seen the
//! terminal event of the exchange.
//!
//! ```ignore
//! let transport = GrpcTransport::connect("http://[::1]:10000").await?;
//! let features = load_features("data/route_guide_db.json")?;
//! let client = GuideClient::new(transport, features, ClientConfig::default());
//!
//! let mut rng = StdRng::from_entropy();
//! let summary = client.record_route(&mut rng).await?;
//!
//! let chat = client.route_chat().await?;
//! if !chat.await_until(Duration::from_secs(60)).await {
//!     chat.cancel();
//! }
//! ```

pub mod routeguide {
    //! Messages and service stubs generated from `proto/routeguide.proto`.
    tonic::include_proto!("routeguide");
}

pub mod call;
pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod outbound;
pub mod service;
pub mod signal;
pub mod sink;
pub mod transport;

pub use call::{open_streaming_call, InboundStream};
pub use client::{GuideClient, RouteChat};
pub use config::ClientConfig;
pub use data::{load_features, parse_features};
pub use error::ClientError;
pub use outbound::{ChannelOutbound, OutboundStream};
pub use service::RouteGuideService;
pub use signal::CompletionSignal;
pub use sink::{Exchange, ExchangeOutcome, RecordingSink, ResponseSink};
pub use transport::{GrpcTransport, RouteGuideTransport};
