use futures::{future, stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use tracing::info;

use crate::call::{open_streaming_call, InboundStream};
use crate::error::ClientError;
use crate::outbound::OutboundStream;
use crate::routeguide::route_guide_client::RouteGuideClient;
use crate::routeguide::{Feature, Point, Rectangle, RouteNote, RouteSummary};
use crate::sink::ResponseSink;

/// The RouteGuide calls as the client drives them.
///
/// The streaming calls return immediately with the send side of the exchange;
/// everything the server sends back, including a failure to establish the
/// call, arrives at `sink`.
#[tonic::async_trait]
pub trait RouteGuideTransport: Send + Sync {
    async fn get_feature(&self, point: Point) -> Result<Feature, Status>;

    async fn list_features(&self, rectangle: Rectangle) -> Result<InboundStream<Feature>, Status>;

    fn record_route(
        &self,
        sink: Box<dyn ResponseSink<RouteSummary>>,
    ) -> Box<dyn OutboundStream<Point>>;

    fn route_chat(
        &self,
        sink: Box<dyn ResponseSink<RouteNote>>,
    ) -> Box<dyn OutboundStream<RouteNote>>;
}

/// [`RouteGuideTransport`] over a tonic channel.
#[derive(Clone)]
pub struct GrpcTransport {
    client: RouteGuideClient<Channel>,
}

impl GrpcTransport {
    pub fn new(channel: Channel) -> Self {
        GrpcTransport {
            client: RouteGuideClient::new(channel),
        }
    }

    /// Connects to `target`, e.g. `http://[::1]:10000`.
    pub async fn connect(target: impl Into<String>) -> Result<Self, ClientError> {
        let target = target.into();
        let endpoint =
            Endpoint::from_shared(target.clone()).map_err(|e| ClientError::InvalidTarget {
                target: target.clone(),
                reason: e.to_string(),
            })?;

        let channel = endpoint
            .connect()
            .await
            .map_err(|source| ClientError::Connect {
                target: target.clone(),
                source,
            })?;

        info!(target = %target, "Connected");
        Ok(Self::new(channel))
    }
}

#[tonic::async_trait]
impl RouteGuideTransport for GrpcTransport {
    async fn get_feature(&self, point: Point) -> Result<Feature, Status> {
        let mut client = self.client.clone();
        Ok(client.get_feature(Request::new(point)).await?.into_inner())
    }

    async fn list_features(&self, rectangle: Rectangle) -> Result<InboundStream<Feature>, Status> {
        let mut client = self.client.clone();
        let features = client
            .list_features(Request::new(rectangle))
            .await?
            .into_inner();
        Ok(features.boxed())
    }

    fn record_route(
        &self,
        sink: Box<dyn ResponseSink<RouteSummary>>,
    ) -> Box<dyn OutboundStream<Point>> {
        let client = self.client.clone();
        let outbound = open_streaming_call(
            move |requests: ReceiverStream<Point>| async move {
                let mut client = client;
                let summary = client
                    .record_route(Request::new(requests))
                    .await?
                    .into_inner();
                Ok::<InboundStream<RouteSummary>, Status>(
                    stream::once(future::ready(Ok(summary))).boxed(),
                )
            },
            sink,
        );
        Box::new(outbound)
    }

    fn route_chat(
        &self,
        sink: Box<dyn ResponseSink<RouteNote>>,
    ) -> Box<dyn OutboundStream<RouteNote>> {
        let client = self.client.clone();
        let outbound = open_streaming_call(
            move |requests: ReceiverStream<RouteNote>| async move {
                let mut client = client;
                let notes = client
                    .route_chat(Request::new(requests))
                    .await?
                    .into_inner();
                Ok::<InboundStream<RouteNote>, Status>(notes.boxed())
            },
            sink,
        );
        Box::new(outbound)
    }
}
