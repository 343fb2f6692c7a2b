use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tonic::Status;
use tracing::{debug, info, warn};

use crate::call::InboundStream;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::outbound::OutboundStream;
use crate::routeguide::{Feature, Point, Rectangle, RouteNote, RouteSummary};
use crate::signal::CompletionSignal;
use crate::sink::{Exchange, ExchangeOutcome};
use crate::transport::RouteGuideTransport;

pub const RECORD_ROUTE: &str = "RecordRoute";
pub const ROUTE_CHAT: &str = "RouteChat";

/// The notes sent by [`GuideClient::route_chat`], in order.
pub fn default_route_notes() -> Vec<RouteNote> {
    vec![
        RouteNote::new("First message", 0, 0),
        RouteNote::new("Second message", 0, 10_000_000),
        RouteNote::new("Third message", 10_000_000, 0),
        RouteNote::new("Fourth message", 10_000_000, 10_000_000),
    ]
}

/// Drives the RouteGuide calls over a [`RouteGuideTransport`].
///
/// The feature collection is shared read-only between calls; RecordRoute
/// picks its points from it.
pub struct GuideClient<T> {
    transport: T,
    features: Arc<[Feature]>,
    config: ClientConfig,
}

impl<T: RouteGuideTransport> GuideClient<T> {
    pub fn new(transport: T, features: impl Into<Arc<[Feature]>>, config: ClientConfig) -> Self {
        GuideClient {
            transport,
            features: features.into(),
            config,
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Looks up the feature at the given point. A feature with an empty name
    /// means nothing is known there.
    pub async fn get_feature(&self, latitude: i32, longitude: i32) -> Result<Feature, ClientError> {
        info!(latitude, longitude, "*** GetFeature");
        let point = Point::new(latitude, longitude);

        let feature = match self.transport.get_feature(point.clone()).await {
            Ok(feature) => feature,
            Err(status) => {
                warn!(code = ?status.code(), "RPC failed: {}", status.message());
                return Err(status.into());
            }
        };

        if feature.is_named() {
            info!("Found feature called \"{}\" at {}", feature.name, point);
        } else {
            info!("Found no feature at {}", point);
        }
        Ok(feature)
    }

    /// Lists the features inside the rectangle spanned by the two corners.
    /// The returned stream yields them as the server sends them.
    pub async fn list_features(
        &self,
        lo_latitude: i32,
        lo_longitude: i32,
        hi_latitude: i32,
        hi_longitude: i32,
    ) -> Result<InboundStream<Feature>, ClientError> {
        info!(
            lo_latitude,
            lo_longitude,
            hi_latitude,
            hi_longitude,
            "*** ListFeatures"
        );
        let rectangle = Rectangle::new(
            Point::new(lo_latitude, lo_longitude),
            Point::new(hi_latitude, hi_longitude),
        );

        self.transport
            .list_features(rectangle)
            .await
            .map_err(|status| {
                warn!(code = ?status.code(), "RPC failed: {}", status.message());
                ClientError::from(status)
            })
    }

    /// Streams `record_route_points` randomly picked feature locations to the
    /// server and waits for its summary.
    ///
    /// The server may end the exchange before every point was sent; sending
    /// then stops and whatever the server reported is returned. A local
    /// failure while sending aborts the call and is returned as the error.
    pub async fn record_route<R>(
        &self,
        rng: &mut R,
    ) -> Result<ExchangeOutcome<RouteSummary>, ClientError>
    where
        R: Rng,
    {
        info!("*** RecordRoute");
        if self.features.is_empty() {
            return Err(ClientError::NoFeatures);
        }

        let (exchange, sink) = Exchange::<RouteSummary>::new(RECORD_ROUTE);
        let mut outbound = self.transport.record_route(Box::new(sink));
        let (min_delay, max_delay) = self.config.travel_delay_millis();
        let timeout = self.config.record_route_timeout;

        let mut ended_early = false;
        for _ in 0..self.config.record_route_points {
            if exchange.is_finished() {
                ended_early = true;
                break;
            }

            let index = rng.gen_range(0..self.features.len());
            let sent = match self.features[index].location.clone() {
                Some(point) => {
                    info!("Visiting point {}", point);
                    send_within(outbound.as_mut(), point, RECORD_ROUTE, timeout).await
                }
                None => Err(ClientError::MissingLocation { index }),
            };

            match sent {
                Ok(()) => {}
                Err(ClientError::StreamEnded) => {
                    ended_early = true;
                    break;
                }
                Err(ClientError::SendTimeout { .. }) => {
                    warn!("RecordRoute server stopped reading points");
                    if self.config.cancel_on_timeout {
                        cancel(outbound.as_mut(), RECORD_ROUTE);
                    }
                    return Ok(ExchangeOutcome::TimedOut);
                }
                Err(err) => return Err(abort(outbound.as_mut(), err)),
            }

            let delay = rng.gen_range(min_delay..=max_delay);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if ended_early {
            debug!("Server ended RecordRoute before all points were sent");
        } else {
            outbound.close_normally()?;
        }

        if !exchange.await_until(timeout).await {
            warn!("RecordRoute can not finish within {:?}", timeout);
            if self.config.cancel_on_timeout {
                cancel(outbound.as_mut(), RECORD_ROUTE);
            }
            return Ok(ExchangeOutcome::TimedOut);
        }

        Ok(summarize(exchange.into_outcome()))
    }

    /// Sends the four [`default_route_notes`] and returns without waiting for
    /// the server; see [`route_chat_notes`](Self::route_chat_notes).
    pub async fn route_chat(&self) -> Result<RouteChat, ClientError> {
        self.route_chat_notes(default_route_notes()).await
    }

    /// Sends `notes` in order without waiting for replies, closes the send
    /// side and hands the still-running exchange back to the caller, who
    /// decides how long to wait for it.
    ///
    /// A server that stops reading makes this fail with
    /// [`ClientError::SendTimeout`] once a single note has waited
    /// `route_chat_timeout`.
    pub async fn route_chat_notes<I>(&self, notes: I) -> Result<RouteChat, ClientError>
    where
        I: IntoIterator<Item = RouteNote>,
        I::IntoIter: Send,
    {
        info!("*** RouteChat");
        let (exchange, sink) = Exchange::<RouteNote>::new(ROUTE_CHAT);
        let sink = sink.prefixed("Got message ");
        let mut outbound = self.transport.route_chat(Box::new(sink));
        let timeout = self.config.route_chat_timeout;

        let mut ended_early = false;
        for note in notes {
            info!("Sending message {}", note);
            match send_within(outbound.as_mut(), note, ROUTE_CHAT, timeout).await {
                Ok(()) => {}
                Err(ClientError::StreamEnded) => {
                    ended_early = true;
                    break;
                }
                Err(err @ ClientError::SendTimeout { .. }) => {
                    warn!("RouteChat server stopped reading notes");
                    if self.config.cancel_on_timeout {
                        cancel(outbound.as_mut(), ROUTE_CHAT);
                    }
                    return Err(err);
                }
                Err(err) => return Err(abort(outbound.as_mut(), err)),
            }
        }

        if ended_early {
            debug!("Server ended RouteChat before all notes were sent");
        } else {
            outbound.close_normally()?;
        }

        Ok(RouteChat { exchange, outbound })
    }

    /// [`route_chat`](Self::route_chat) followed by a wait bounded by
    /// `route_chat_timeout`.
    pub async fn run_route_chat(&self) -> Result<ExchangeOutcome<Vec<RouteNote>>, ClientError> {
        let mut chat = match self.route_chat().await {
            Ok(chat) => chat,
            Err(ClientError::SendTimeout { .. }) => return Ok(ExchangeOutcome::TimedOut),
            Err(err) => return Err(err),
        };

        let timeout = self.config.route_chat_timeout;
        if !chat.await_until(timeout).await {
            warn!("RouteChat can not finish within {:?}", timeout);
            if self.config.cancel_on_timeout {
                chat.cancel();
            }
            return Ok(ExchangeOutcome::TimedOut);
        }
        Ok(chat.into_outcome())
    }
}

/// A RouteChat exchange whose send side is closed but whose inbound side may
/// still be running.
pub struct RouteChat {
    exchange: Exchange<RouteNote>,
    outbound: Box<dyn OutboundStream<RouteNote>>,
}

impl RouteChat {
    pub fn signal(&self) -> &CompletionSignal {
        self.exchange.signal()
    }

    pub async fn await_until(&self, timeout: Duration) -> bool {
        self.exchange.await_until(timeout).await
    }

    /// Notes received so far.
    pub fn received(&self) -> usize {
        self.exchange.element_count()
    }

    /// Aborts the call if it is still running.
    pub fn cancel(&mut self) {
        if !self.exchange.is_finished() {
            cancel(self.outbound.as_mut(), ROUTE_CHAT);
        }
    }

    pub fn into_outcome(self) -> ExchangeOutcome<Vec<RouteNote>> {
        self.exchange.into_outcome()
    }
}

/// `send` bounded by `timeout`.
async fn send_within<Req>(
    outbound: &mut (dyn OutboundStream<Req> + 'static),
    item: Req,
    call: &'static str,
    timeout: Duration,
) -> Result<(), ClientError>
where
    Req: Send + 'static,
{
    match tokio::time::timeout(timeout, outbound.send(item)).await {
        Ok(sent) => sent,
        Err(_) => Err(ClientError::SendTimeout { call, timeout }),
    }
}

/// Puts the outbound side into the aborted state and hands back `err` for the
/// caller to raise.
fn abort<Req>(outbound: &mut (dyn OutboundStream<Req> + 'static), err: ClientError) -> ClientError
where
    Req: Send + 'static,
{
    warn!("Aborting call: {}", err);
    if let Err(close_err) = outbound.close_with_error(Status::cancelled(err.to_string())) {
        debug!("Call already aborted: {}", close_err);
    }
    err
}

fn cancel<Req>(outbound: &mut (dyn OutboundStream<Req> + 'static), call: &str)
where
    Req: Send + 'static,
{
    let cause = Status::deadline_exceeded(format!("{} abandoned by the client", call));
    if let Err(err) = outbound.close_with_error(cause) {
        debug!(call, "Call already aborted: {}", err);
    }
}

fn summarize(outcome: ExchangeOutcome<Vec<RouteSummary>>) -> ExchangeOutcome<RouteSummary> {
    match outcome {
        ExchangeOutcome::Completed(mut summaries) => match summaries.pop() {
            Some(summary) => ExchangeOutcome::Completed(summary),
            None => ExchangeOutcome::Failed(Status::internal(
                "RecordRoute completed without a summary",
            )),
        },
        ExchangeOutcome::Failed(status) => ExchangeOutcome::Failed(status),
        ExchangeOutcome::TimedOut => ExchangeOutcome::TimedOut,
    }
}
