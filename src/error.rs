use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by the RouteGuide client.
///
/// Failures reported by the server on a streaming call do not show up here
/// directly: they reach the [`ResponseSink`](crate::ResponseSink) and are
/// surfaced as [`ExchangeOutcome::Failed`](crate::ExchangeOutcome::Failed).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The target string is not a valid URI.
    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Failed to establish the channel.
    #[error("failed to connect to '{target}'")]
    Connect {
        target: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// A call was rejected or aborted by the server.
    #[error("RPC failed: {0}")]
    Rpc(#[from] tonic::Status),

    /// `send` or a close was attempted after the outbound side was closed.
    #[error("outbound stream already closed")]
    OutboundClosed,

    /// The remote side stopped reading requests.
    #[error("outbound stream ended by the remote side")]
    StreamEnded,

    /// The remote side accepted the call but stopped reading requests.
    #[error("{call} could not send within {timeout:?}")]
    SendTimeout {
        call: &'static str,
        timeout: Duration,
    },

    /// A feature picked for the route has no location.
    #[error("feature {index} has no location")]
    MissingLocation { index: usize },

    /// A route was requested over an empty feature collection.
    #[error("feature collection is empty")]
    NoFeatures,

    /// The feature database could not be read.
    #[error("failed to read feature database '{}'", path.display())]
    ReadData {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The feature database is not valid JSON.
    #[error("failed to parse feature database")]
    ParseData(#[from] serde_json::Error),
}
