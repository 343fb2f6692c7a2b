// In-memory RouteGuide server, used by the `server` binary and the
// integration tests.
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::routeguide::route_guide_server::{RouteGuide, RouteGuideServer};
use crate::routeguide::{Feature, Point, Rectangle, RouteNote, RouteSummary};

type StreamResponse<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + Sync + 'static>>;

/// Serves a fixed, read-only feature collection.
#[derive(Debug, Clone)]
pub struct RouteGuideService {
    features: Arc<[Feature]>,
}

impl RouteGuideService {
    pub fn new(features: impl Into<Arc<[Feature]>>) -> Self {
        RouteGuideService {
            features: features.into(),
        }
    }

    pub fn into_server(self) -> RouteGuideServer<Self> {
        RouteGuideServer::new(self)
    }

    fn feature_at(&self, point: &Point) -> Option<&Feature> {
        self.features
            .iter()
            .find(|feature| feature.location.as_ref() == Some(point))
    }
}

fn required_location(note: &RouteNote) -> Result<Point, Status> {
    note.location
        .clone()
        .ok_or_else(|| Status::invalid_argument("route note without location"))
}

#[tonic::async_trait]
impl RouteGuide for RouteGuideService {
    async fn get_feature(&self, request: Request<Point>) -> Result<Response<Feature>, Status> {
        let point = request.into_inner();
        debug!(%point, "GetFeature");

        let feature = self.feature_at(&point).cloned().unwrap_or(Feature {
            name: String::new(),
            location: Some(point),
        });
        Ok(Response::new(feature))
    }

    type ListFeaturesStream = StreamResponse<Feature>;

    async fn list_features(
        &self,
        request: Request<Rectangle>,
    ) -> Result<Response<Self::ListFeaturesStream>, Status> {
        let rectangle = request.into_inner();
        debug!(?rectangle, "ListFeatures");

        let features = self.features.clone();
        let (tx, rx) = mpsc::channel(4);

        tokio::spawn(async move {
            let matching = features.iter().filter(|feature| {
                feature
                    .location
                    .as_ref()
                    .map_or(false, |location| rectangle.contains(location))
            });
            for feature in matching {
                debug!(name = %feature.name, "  => send");
                if tx.send(Ok(feature.clone())).await.is_err() {
                    // The client went away.
                    break;
                }
            }
        });

        Ok(Response::new(Box::pin(
            tokio_stream::wrappers::ReceiverStream::new(rx),
        )))
    }

    async fn record_route(
        &self,
        request: Request<tonic::Streaming<Point>>,
    ) -> Result<Response<RouteSummary>, Status> {
        info!("RecordRoute");

        let mut stream = request.into_inner();
        let mut summary = RouteSummary::default();
        let mut last_point: Option<Point> = None;
        let now = Instant::now();

        while let Some(point) = stream.next().await {
            // A broken request stream fails the whole call.
            let point = point?;
            debug!(%point, "  ==> Point");

            summary.point_count += 1;
            if self.feature_at(&point).map_or(false, Feature::is_named) {
                summary.feature_count += 1;
            }
            if let Some(last_point) = last_point.as_ref() {
                summary.distance += last_point.distance_to(&point);
            }
            last_point = Some(point);
        }

        summary.elapsed_time = now.elapsed().as_secs() as i32;
        Ok(Response::new(summary))
    }

    type RouteChatStream = StreamResponse<RouteNote>;

    async fn route_chat(
        &self,
        request: Request<tonic::Streaming<RouteNote>>,
    ) -> Result<Response<Self::RouteChatStream>, Status> {
        info!("RouteChat");

        let mut location_to_notes: HashMap<Point, Vec<RouteNote>> = HashMap::new();
        let mut stream = request.into_inner();

        // Every incoming note is answered with all notes left at its location
        // so far, itself included.
        let output = async_stream::try_stream! {
            while let Some(note) = stream.next().await {
                let note = note?;
                let location = required_location(&note)?;

                let location_notes = location_to_notes.entry(location).or_insert_with(Vec::new);
                location_notes.push(note);

                for note in location_notes.iter() {
                    yield note.clone();
                }
            }
        };

        Ok(Response::new(Box::pin(output) as Self::RouteChatStream))
    }
}
